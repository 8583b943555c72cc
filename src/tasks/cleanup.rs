//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries,
//! independent of reads. Fires at the configured TTL interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns the periodic sweep.
///
/// Each tick acquires the cache's write lock and removes every expired
/// entry. The returned handle is the task's cancellation mechanism: it is
/// aborted during graceful shutdown rather than left running unowned.
pub fn spawn_cleanup_task(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "TTL sweep task started");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut guard = cache.write().await;
                guard.cleanup_expired()
            };

            if removed > 0 {
                info!(removed, "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep found no expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, CacheStore};
    use crate::test_util::make_valid_order;

    #[tokio::test]
    async fn test_sweep_removes_expired_entries_without_reads() {
        let cache = shared(CacheStore::new(100, 20));
        let order = make_valid_order();
        cache
            .write()
            .await
            .set(order.order_uid.clone(), order.clone());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Entry gone through the sweep alone, no get() involved
        assert!(cache.read().await.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_preserves_live_entries() {
        let cache = shared(CacheStore::new(100, 60_000));
        let order = make_valid_order();
        cache
            .write()
            .await
            .set(order.order_uid.clone(), order.clone());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.read().await.len(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_is_cancellable() {
        let cache = shared(CacheStore::new(100, 60_000));
        let handle = spawn_cleanup_task(cache, Duration::from_millis(20));

        handle.abort();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }
}
