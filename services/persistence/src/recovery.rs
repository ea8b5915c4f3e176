//! Cache rehydration: boot the cache from the durable store
//!
//! Runs once at process startup, before the ingestion pipeline or the
//! HTTP surface accept any traffic, so no request ever observes an
//! empty or partially populated cache. A store failure here aborts
//! startup: the process must not serve an unreliable cache.

use std::time::Instant;

use tracing::info;

use crate::cache::OrderCache;
use crate::store::{OrderStore, StoreError};

/// Outcome of a completed rehydration pass.
#[derive(Debug, Clone)]
pub struct RehydrationReport {
    /// Number of records loaded into the cache.
    pub orders_loaded: usize,
    /// Wall-clock time the pass took.
    pub elapsed_ms: u64,
}

/// Load every stored record into the cache.
pub async fn rehydrate<S>(store: &S, cache: &OrderCache) -> Result<RehydrationReport, StoreError>
where
    S: OrderStore + ?Sized,
{
    let started = Instant::now();
    let records = store.bootstrap().await?;

    let mut loaded = 0;
    for (uid, payload) in records {
        cache.set(uid, payload);
        loaded += 1;
    }

    let report = RehydrationReport {
        orders_loaded: loaded,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        orders = report.orders_loaded,
        elapsed_ms = report.elapsed_ms,
        "cache restored"
    );
    Ok(report)
}
