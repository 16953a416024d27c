pub mod feed;
pub mod sync;

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;

pub use sync::CalendarSyncEngine;

/// The published set of calendar days unavailable for booking: strictly
/// increasing, no duplicates, plus the digest of its canonical form used to
/// suppress redundant publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedDates {
    pub days: Vec<NaiveDate>,
    pub digest: String,
}

impl Default for BlockedDates {
    fn default() -> Self {
        Self {
            days: Vec::new(),
            digest: feed::digest(&[]),
        }
    }
}

impl BlockedDates {
    pub fn is_blocked(&self, day: &NaiveDate) -> bool {
        self.days.binary_search(day).is_ok()
    }
}

/// Shared read handle on the current [`BlockedDates`]. Only the sync engine
/// publishes; everything else reads. A publish is a single guarded pointer
/// swap, so overlapping sync runs at worst publish twice.
#[derive(Clone, Default)]
pub struct BlockedDatesHandle {
    inner: Arc<RwLock<Arc<BlockedDates>>>,
}

impl BlockedDatesHandle {
    pub fn current(&self) -> Arc<BlockedDates> {
        self.inner.read().clone()
    }

    pub fn is_blocked(&self, day: &NaiveDate) -> bool {
        self.inner.read().is_blocked(day)
    }

    pub fn publish(&self, set: BlockedDates) {
        *self.inner.write() = Arc::new(set);
    }
}
