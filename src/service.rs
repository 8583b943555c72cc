//! Read-Through Service
//!
//! Point lookups of the order aggregate: cache first, storage on miss,
//! cache backfill on the way out. Concurrent misses on the same id are
//! not de-duplicated; each may query storage and write the cache, and the
//! last writer's TTL wins.

use std::sync::Arc;

use tracing::debug;

use crate::cache::SharedCache;
use crate::error::{OrderError, Result};
use crate::models::Order;
use crate::storage::OrderStore;

// == Order Service ==
/// Serves order lookups through the cache.
pub struct OrderService {
    cache: SharedCache,
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(cache: SharedCache, store: Arc<dyn OrderStore>) -> Self {
        Self { cache, store }
    }

    /// Returns the aggregate for `order_uid`.
    ///
    /// A cache hit returns immediately. On miss the storage engine is
    /// consulted; an absent id surfaces as [`OrderError::NotFound`], a
    /// found aggregate backfills the cache with a fresh TTL. Storage
    /// errors propagate unchanged.
    pub async fn get_by_id(&self, order_uid: &str) -> Result<Order> {
        // Write lock: a hit touches LRU recency state
        if let Some(order) = self.cache.write().await.get(order_uid) {
            debug!(order_uid, "cache hit");
            return Ok(order);
        }

        let order = self
            .store
            .load(order_uid)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_uid.to_string()))?;

        debug!(order_uid, "cache miss, loaded from storage");
        self.cache
            .write()
            .await
            .set(order.order_uid.clone(), order.clone());

        Ok(order)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, CacheStore};
    use crate::storage::MemoryStore;
    use crate::test_util::{make_valid_order, make_valid_order_with_uid};

    fn make_service(max_entries: usize) -> (OrderService, Arc<MemoryStore>, SharedCache) {
        let cache = shared(CacheStore::new(max_entries, 300_000));
        let store = Arc::new(MemoryStore::new());
        let service = OrderService::new(cache.clone(), store.clone());
        (service, store, cache)
    }

    #[tokio::test]
    async fn test_cache_hit_skips_storage() {
        let (service, _store, cache) = make_service(10);
        let order = make_valid_order();

        // Only cached, never persisted: a hit must not touch storage
        cache
            .write()
            .await
            .set(order.order_uid.clone(), order.clone());

        let found = service.get_by_id(&order.order_uid).await.unwrap();
        assert_eq!(found, order);
    }

    #[tokio::test]
    async fn test_miss_falls_back_to_storage_and_backfills() {
        let (service, store, cache) = make_service(10);
        let order = make_valid_order();
        store.persist(&order).await.unwrap();

        let found = service.get_by_id(&order.order_uid).await.unwrap();
        assert_eq!(found, order);

        // Backfilled: the next read is a cache hit
        assert_eq!(cache.write().await.get(&order.order_uid), Some(order));
    }

    #[tokio::test]
    async fn test_absent_id_is_not_found() {
        let (service, _store, _cache) = make_service(10);

        let result = service.get_by_id("no-such-order").await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_evicted_entry_recovered_through_storage() {
        // Fill a 10-entry cache from storage, push an 11th id, then read
        // the evicted id back unchanged.
        let (service, store, cache) = make_service(10);

        let mut orders = Vec::new();
        for i in 0..10 {
            let order = make_valid_order_with_uid(&format!("order{:02}", i));
            store.persist(&order).await.unwrap();
            cache
                .write()
                .await
                .set(order.order_uid.clone(), order.clone());
            orders.push(order);
        }

        let eleventh = make_valid_order_with_uid("order10");
        store.persist(&eleventh).await.unwrap();
        cache
            .write()
            .await
            .set(eleventh.order_uid.clone(), eleventh.clone());

        assert_eq!(cache.read().await.len(), 10);
        // order00 was the least recently used entry
        {
            let mut guard = cache.write().await;
            assert!(guard.get("order00").is_none());
        }

        let recovered = service.get_by_id("order00").await.unwrap();
        assert_eq!(recovered, orders[0]);
    }
}
