//! In-memory store adapter
//!
//! A [`OrderStore`] over a concurrent map, used by tests and local runs
//! that have no database. The availability toggle lets callers exercise
//! the `StoreUnavailable` failure path deterministically.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use types::ids::OrderUid;

use crate::store::{OrderStore, StoreError};

/// Map-backed [`OrderStore`] with controllable availability.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<OrderUid, Bytes>,
    unavailable: AtomicBool,
    upserts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the simulated backend availability.
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of successful upserts since creation.
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read a stored payload directly, bypassing the store contract.
    pub fn get(&self, uid: &str) -> Option<Bytes> {
        self.records.get(uid).map(|entry| entry.value().clone())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn bootstrap(&self) -> Result<Vec<(OrderUid, Bytes)>, StoreError> {
        self.check_available()?;
        Ok(self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect())
    }

    async fn upsert(&self, uid: &OrderUid, payload: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.records
            .insert(uid.clone(), Bytes::from(payload.to_owned()));
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> OrderUid {
        OrderUid::new(s)
    }

    #[tokio::test]
    async fn test_upsert_and_bootstrap() {
        let store = MemoryStore::new();
        store.upsert(&uid("a1"), r#"{"order_uid":"a1"}"#).await.unwrap();
        store.upsert(&uid("a2"), r#"{"order_uid":"a2"}"#).await.unwrap();

        let mut records = store.bootstrap().await.unwrap();
        records.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0.as_str(), "a1");
        assert_eq!(records[1].1, Bytes::from(r#"{"order_uid":"a2"}"#));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_payload() {
        let store = MemoryStore::new();
        store.upsert(&uid("a1"), r#"{"v":1}"#).await.unwrap();
        store.upsert(&uid("a1"), r#"{"v":2}"#).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a1").unwrap(), Bytes::from(r#"{"v":2}"#));
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        store.upsert(&uid("a1"), r#"{"v":1}"#).await.unwrap();
        let before = store.get("a1").unwrap();

        store.upsert(&uid("a1"), r#"{"v":1}"#).await.unwrap();
        assert_eq!(store.get("a1").unwrap(), before);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_both_operations() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(store.upsert(&uid("a1"), "{}").await.is_err());
        assert!(store.bootstrap().await.is_err());

        store.set_available(true);
        assert!(store.upsert(&uid("a1"), "{}").await.is_ok());
    }
}
