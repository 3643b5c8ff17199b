//! Progress aggregation with one-shot completion detection.

use super::tracker::FacilityStateTracker;
use super::types::{BatchCounts, DownloadStatus};

/// Derives batch counters from the tracker and reports completion once.
#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    finalized: bool,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self, tracker: &FacilityStateTracker) -> BatchCounts {
        let snapshot = tracker.snapshot();
        let completed = snapshot.count(DownloadStatus::Completed);
        let failed = snapshot.count(DownloadStatus::Failed);
        BatchCounts {
            total: snapshot.len(),
            completed,
            failed,
            remaining: snapshot.len() - completed - failed,
        }
    }

    /// True when every item is terminal. An empty tracker is never complete.
    pub fn is_complete(&self, tracker: &FacilityStateTracker) -> bool {
        let counts = self.counts(tracker);
        counts.total > 0 && counts.finished() == counts.total
    }

    /// Recompute after a transition.
    ///
    /// Returns the final counts the first time completion is seen and `None`
    /// on every later call until [`reset`](Self::reset).
    pub fn observe(&mut self, tracker: &FacilityStateTracker) -> Option<BatchCounts> {
        if self.finalized || !self.is_complete(tracker) {
            return None;
        }
        self.finalized = true;
        Some(self.counts(tracker))
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Re-arm for a new batch.
    pub fn reset(&mut self) {
        self.finalized = false;
    }
}
