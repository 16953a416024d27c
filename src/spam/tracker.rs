use std::collections::HashMap;

use parking_lot::Mutex;

/// Per-origin submission counter within the current day. The whole table is
/// cleared by the daily reset job; individual entries never expire on their
/// own, and nothing survives a restart.
#[derive(Debug, Default)]
pub struct RateTracker {
    counts: Mutex<HashMap<String, u32>>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `identity` and returns the updated count.
    pub fn record_and_count(&self, identity: &str) -> u32 {
        let mut counts = self.counts.lock();
        let count = counts.entry(identity.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Clears all entries, returning how many origins were tracked.
    pub fn reset(&self) -> usize {
        let mut counts = self.counts.lock();
        let cleared = counts.len();
        counts.clear();
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_identity() {
        let tracker = RateTracker::new();
        assert_eq!(tracker.record_and_count("203.0.113.7"), 1);
        assert_eq!(tracker.record_and_count("203.0.113.7"), 2);
        assert_eq!(tracker.record_and_count("198.51.100.1"), 1);
        assert_eq!(tracker.record_and_count("203.0.113.7"), 3);
    }

    #[test]
    fn reset_clears_every_entry() {
        let tracker = RateTracker::new();
        tracker.record_and_count("203.0.113.7");
        tracker.record_and_count("203.0.113.7");
        tracker.record_and_count("198.51.100.1");

        assert_eq!(tracker.reset(), 2);
        assert_eq!(tracker.record_and_count("203.0.113.7"), 1);
        assert_eq!(tracker.record_and_count("198.51.100.1"), 1);
    }
}
