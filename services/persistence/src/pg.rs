//! PostgreSQL store adapter
//!
//! Connection pooling via deadpool-postgres; the schema is created on
//! connect so a fresh database works out of the box. Payloads live in a
//! JSONB column keyed by `order_uid`, with insert-or-update writes.

use bytes::Bytes;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tracing::{debug, warn};

use crate::store::{OrderStore, StoreError};
use async_trait::async_trait;
use types::ids::OrderUid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS orders (
  order_uid  TEXT PRIMARY KEY,
  payload    JSONB NOT NULL,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_orders_uid ON orders (order_uid);
";

const POOL_SIZE: usize = 16;

/// PostgreSQL-backed [`OrderStore`].
///
/// Cheap to clone; clones share the underlying pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: Pool,
}

impl PgOrderStore {
    /// Connect to the database at `dsn` and ensure the schema exists.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = build_pool(dsn)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Close the underlying connection pool.
    ///
    /// Part of explicit teardown at shutdown; subsequent calls fail
    /// with [`StoreError::Unavailable`].
    pub fn close(&self) {
        self.pool.close();
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn().await?;
        conn.batch_execute(SCHEMA)
            .await
            .map_err(StoreError::unavailable)?;
        debug!("orders schema ensured");
        Ok(())
    }

    async fn conn(&self) -> Result<Object, StoreError> {
        self.pool.get().await.map_err(StoreError::unavailable)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn bootstrap(&self) -> Result<Vec<(OrderUid, Bytes)>, StoreError> {
        let conn = self.conn().await?;
        let rows = conn
            .query("SELECT order_uid, payload::text FROM orders", &[])
            .await
            .map_err(StoreError::unavailable)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let uid: String = row.get(0);
            let payload: String = row.get(1);
            match OrderUid::try_new(uid) {
                Some(uid) => records.push((uid, Bytes::from(payload))),
                // The primary key should never be empty; skip rather
                // than poison the whole bootstrap.
                None => warn!("skipping stored record with empty order_uid"),
            }
        }
        Ok(records)
    }

    async fn upsert(&self, uid: &OrderUid, payload: &str) -> Result<(), StoreError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO orders (order_uid, payload) VALUES ($1, $2::jsonb)
             ON CONFLICT (order_uid) DO UPDATE SET payload = EXCLUDED.payload",
            &[&uid.as_str(), &payload],
        )
        .await
        .map_err(StoreError::unavailable)?;
        Ok(())
    }
}

/// Build a connection pool from a `postgres://` connection string.
fn build_pool(dsn: &str) -> Result<Pool, StoreError> {
    let pg_config: tokio_postgres::Config = dsn.parse().map_err(StoreError::unavailable)?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    Pool::builder(manager)
        .max_size(POOL_SIZE)
        .build()
        .map_err(StoreError::unavailable)
}
