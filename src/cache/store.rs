//! Cache Store Module
//!
//! Bounded order cache combining HashMap storage with LRU eviction and a
//! cache-wide TTL. Shared across workers and readers as
//! `Arc<RwLock<CacheStore>>`; that lock is the only synchronization
//! primitive in the core.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::models::Order;

// == Cache Store ==
/// Bounded key -> order store with per-entry TTL.
#[derive(Debug)]
pub struct CacheStore {
    /// order_uid -> entry storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Entry lifetime in milliseconds
    ttl_ms: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_entries` - Capacity bound; inserting beyond it evicts the LRU entry
    /// * `ttl_ms` - Lifetime applied to every entry on insert or replace
    pub fn new(max_entries: usize, ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            ttl_ms,
        }
    }

    // == Set ==
    /// Inserts or replaces an order and resets its expiration to now + ttl.
    ///
    /// A replace never carries the old TTL over. If the cache is at capacity
    /// and the id is new, the least recently used entry is evicted first.
    /// Capacity pressure is absorbed here and never surfaced as an error.
    /// A zero-capacity cache stores nothing.
    pub fn set(&mut self, order_uid: String, order: Order) {
        if self.max_entries == 0 {
            return;
        }

        let is_overwrite = self.entries.contains_key(&order_uid);

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        self.entries
            .insert(order_uid.clone(), CacheEntry::new(order, self.ttl_ms));
        self.lru.touch(&order_uid);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns a copy of the order if present and not expired.
    ///
    /// An expired-but-not-yet-swept entry reports `None` and is removed
    /// lazily. A hit touches the LRU order.
    pub fn get(&mut self, order_uid: &str) -> Option<Order> {
        match self.entries.get(order_uid) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(order_uid);
                self.lru.remove(order_uid);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let order = entry.order.clone();
                self.stats.record_hit();
                self.lru.touch(order_uid);
                Some(order)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry if present; deleting an absent key is a no-op.
    pub fn delete(&mut self, order_uid: &str) {
        if self.entries.remove(order_uid).is_some() {
            self.lru.remove(order_uid);
            self.stats.set_total_entries(self.entries.len());
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries; returns how many were removed.
    ///
    /// Driven by the background sweep task, independent of reads.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
            self.lru.remove(&key);
        }

        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{make_valid_order, make_valid_order_with_uid};
    use std::thread::sleep;
    use std::time::Duration;

    const TEST_TTL_MS: u64 = 300_000;

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(100, TEST_TTL_MS);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(100, TEST_TTL_MS);
        let order = make_valid_order();

        store.set(order.order_uid.clone(), order.clone());
        let cached = store.get(&order.order_uid);

        assert_eq!(cached, Some(order));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(100, TEST_TTL_MS);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_delete() {
        let mut store = CacheStore::new(100, TEST_TTL_MS);
        let order = make_valid_order();

        store.set(order.order_uid.clone(), order.clone());
        store.delete(&order.order_uid);

        assert!(store.is_empty());
        assert_eq!(store.get(&order.order_uid), None);
    }

    #[test]
    fn test_store_delete_absent_key_is_noop() {
        let mut store = CacheStore::new(100, TEST_TTL_MS);
        store.delete("nonexistent");
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrite_replaces_value() {
        let mut store = CacheStore::new(100, TEST_TTL_MS);
        let order = make_valid_order();
        let mut updated = order.clone();
        updated.track_number = "NEWTRACK".to_string();

        store.set(order.order_uid.clone(), order.clone());
        store.set(order.order_uid.clone(), updated.clone());

        assert_eq!(store.get(&order.order_uid), Some(updated));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite_resets_ttl() {
        let mut store = CacheStore::new(100, 60);
        let order = make_valid_order();

        store.set(order.order_uid.clone(), order.clone());
        sleep(Duration::from_millis(40));

        // Replacing must grant a full fresh TTL, not carry the old one over.
        store.set(order.order_uid.clone(), order.clone());
        sleep(Duration::from_millis(40));

        assert!(store.get(&order.order_uid).is_some());
    }

    #[test]
    fn test_store_ttl_expiration_lazy() {
        let mut store = CacheStore::new(100, 1);
        let order = make_valid_order();

        store.set(order.order_uid.clone(), order.clone());
        sleep(Duration::from_millis(5));

        assert_eq!(store.get(&order.order_uid), None);
        // Lazy discovery also removes the entry
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_lru_eviction_at_capacity() {
        let mut store = CacheStore::new(3, TEST_TTL_MS);

        for uid in ["order1", "order2", "order3"] {
            store.set(uid.to_string(), make_valid_order_with_uid(uid));
        }

        // Cache is full; the oldest entry goes first
        store.set("order4".to_string(), make_valid_order_with_uid("order4"));

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("order1"), None);
        assert!(store.get("order2").is_some());
        assert!(store.get("order3").is_some());
        assert!(store.get("order4").is_some());
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(3, TEST_TTL_MS);

        for uid in ["order1", "order2", "order3"] {
            store.set(uid.to_string(), make_valid_order_with_uid(uid));
        }

        // Reading order1 makes order2 the eviction candidate
        store.get("order1");
        store.set("order4".to_string(), make_valid_order_with_uid("order4"));

        assert!(store.get("order1").is_some());
        assert_eq!(store.get("order2"), None);
    }

    #[test]
    fn test_store_overwrite_does_not_evict() {
        let mut store = CacheStore::new(2, TEST_TTL_MS);

        store.set("order1".to_string(), make_valid_order_with_uid("order1"));
        store.set("order2".to_string(), make_valid_order_with_uid("order2"));
        // At capacity, but replacing an existing key must not evict anything
        store.set("order1".to_string(), make_valid_order_with_uid("order1"));

        assert_eq!(store.len(), 2);
        assert!(store.get("order2").is_some());
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_zero_capacity_stores_nothing() {
        let mut store = CacheStore::new(0, TEST_TTL_MS);

        store.set("order1".to_string(), make_valid_order_with_uid("order1"));
        store.set("order2".to_string(), make_valid_order_with_uid("order2"));

        // The capacity bound holds at zero: nothing is ever retained
        assert!(store.is_empty());
        assert_eq!(store.get("order1"), None);
        assert_eq!(store.get("order2"), None);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let mut store = CacheStore::new(100, 30);
        store.set("short".to_string(), make_valid_order_with_uid("short"));

        let mut long_lived = CacheStore::new(100, TEST_TTL_MS);
        long_lived.set("long".to_string(), make_valid_order_with_uid("long"));

        sleep(Duration::from_millis(50));

        assert_eq!(store.cleanup_expired(), 1);
        assert!(store.is_empty());
        assert_eq!(long_lived.cleanup_expired(), 0);
        assert_eq!(long_lived.len(), 1);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(100, TEST_TTL_MS);
        let order = make_valid_order();

        store.set(order.order_uid.clone(), order.clone());
        store.get(&order.order_uid); // hit
        store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
