//! Concurrent order cache
//!
//! In-memory mapping from order identifier to the last accepted raw
//! payload. Many concurrent readers; writers take a per-shard lock for
//! the duration of a single entry replacement, so a read never observes
//! a partially written value.
//!
//! No eviction, TTL, or capacity bound: the full working set is assumed
//! to fit in memory for this system's scale, and the durable store can
//! always rebuild the cache from scratch.

use bytes::Bytes;
use dashmap::DashMap;
use types::ids::OrderUid;

/// Shared read cache over all accepted orders.
///
/// Only point lookups and point writes are exposed; iteration is
/// deliberately not part of the interface.
#[derive(Default)]
pub struct OrderCache {
    entries: DashMap<OrderUid, Bytes>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted payload for `uid`, if any.
    pub fn get(&self, uid: &str) -> Option<Bytes> {
        self.entries.get(uid).map(|entry| entry.value().clone())
    }

    /// Replace the payload for `uid` (last processed wins).
    pub fn set(&self, uid: OrderUid, payload: Bytes) {
        self.entries.insert(uid, payload);
    }

    /// Number of cached orders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_missing_returns_none() {
        let cache = OrderCache::new();
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_set_then_get() {
        let cache = OrderCache::new();
        cache.set(OrderUid::new("a1"), Bytes::from_static(b"{\"v\":1}"));

        assert_eq!(cache.get("a1"), Some(Bytes::from_static(b"{\"v\":1}")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = OrderCache::new();
        cache.set(OrderUid::new("a1"), Bytes::from_static(b"{\"v\":1}"));
        cache.set(OrderUid::new("a1"), Bytes::from_static(b"{\"v\":2}"));

        assert_eq!(cache.get("a1"), Some(Bytes::from_static(b"{\"v\":2}")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let cache = Arc::new(OrderCache::new());
        cache.set(OrderUid::new("a1"), Bytes::from_static(b"old"));

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    cache.set(OrderUid::new("a1"), Bytes::from_static(b"new"));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        // A reader sees the old or the new value, never
                        // anything else.
                        let value = cache.get("a1").unwrap();
                        assert!(value == Bytes::from_static(b"old") || value == Bytes::from_static(b"new"));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.get("a1"), Some(Bytes::from_static(b"new")));
    }
}
