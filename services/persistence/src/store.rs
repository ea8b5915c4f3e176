//! Durable store contract
//!
//! The store is an abstract keyed table: order identifier → raw JSON
//! payload. Two adapters implement it: PostgreSQL for production
//! ([`crate::pg`]) and an in-memory map for tests and local runs
//! ([`crate::memory`]).

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;
use types::ids::OrderUid;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Wrap any backend failure as an availability error.
    pub fn unavailable(err: impl fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

// ── Contract ────────────────────────────────────────────────────────

/// Durable keyed storage for order documents.
///
/// `upsert` is idempotent: re-applying the same `(uid, payload)` pair
/// any number of times yields the same stored state, which is what
/// makes at-least-once redelivery safe for the ingestion pipeline.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Return every currently stored record.
    ///
    /// Used exactly once, at startup, to seed the cache. A failure here
    /// is fatal to process startup.
    async fn bootstrap(&self) -> Result<Vec<(OrderUid, Bytes)>, StoreError>;

    /// Write or atomically replace the record for `uid`.
    ///
    /// Insert-or-update semantics: a second upsert with the same
    /// identifier and a different payload deterministically replaces
    /// the stored payload.
    async fn upsert(&self, uid: &OrderUid, payload: &str) -> Result<(), StoreError>;
}
