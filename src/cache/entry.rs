//! Cache Entry Module
//!
//! A stored order plus its expiration deadline.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::Order;

// == Cache Entry ==
/// A single cached order aggregate.
///
/// The entry owns its copy of the order; readers only ever receive clones,
/// so nothing outside the cache can mutate a stored aggregate.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached order aggregate
    pub order: Order,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    /// Creates an entry expiring `ttl_ms` milliseconds from now.
    pub fn new(order: Order, ttl_ms: u64) -> Self {
        Self {
            order,
            expires_at: current_timestamp_ms() + ttl_ms,
        }
    }

    /// Checks whether the entry's deadline has passed.
    ///
    /// The boundary counts as expired: once the TTL has fully elapsed the
    /// entry must never be returned again, whether it is discovered lazily
    /// on a read or removed by the background sweep.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::make_valid_order;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_not_expired_within_ttl() {
        let entry = CacheEntry::new(make_valid_order(), 60_000);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new(make_valid_order(), 1);
        sleep(Duration::from_millis(5));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary() {
        let entry = CacheEntry {
            order: make_valid_order(),
            expires_at: current_timestamp_ms(),
        };
        assert!(entry.is_expired(), "entry at the deadline is expired");
    }
}
