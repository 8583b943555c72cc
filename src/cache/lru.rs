//! LRU Tracker Module
//!
//! Recency bookkeeping for capacity-driven eviction. Replaces the
//! arbitrary pick-any-entry policy with a deterministic least-recently-used
//! one, so eviction order is predictable in tests.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Order of keys by access time
    order: VecDeque<String>,
}

impl LruTracker {
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key, or None when empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    /// Returns the least recently used key without removing it.
    #[allow(dead_code)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.back()
    }

    /// Returns the number of tracked keys.
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.order.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_new_keys_keeps_insertion_order() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"a".to_string()));
    }

    #[test]
    fn test_touch_existing_key_moves_to_front() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&"b".to_string()));
    }

    #[test]
    fn test_evict_oldest_in_recency_order() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_remove_unknown_key_is_noop() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.remove("nonexistent");

        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_touch_same_key_tracks_once() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("a");
        lru.touch("a");

        assert_eq!(lru.len(), 1);
    }
}
