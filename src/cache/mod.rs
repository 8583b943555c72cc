//! Cache Module
//!
//! Bounded, concurrent in-memory order cache with per-entry TTL, LRU
//! eviction and periodic background sweeping.

use std::sync::Arc;

use tokio::sync::RwLock;

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

/// The cache as shared by workers, the sweep task and read callers.
///
/// Mutations (`set`, `delete`, sweep) take the write lock; reads that do
/// not touch LRU state may share the read lock.
pub type SharedCache = Arc<RwLock<CacheStore>>;

/// Wraps a store for sharing.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
