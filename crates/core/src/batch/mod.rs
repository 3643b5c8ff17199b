//! Download batch state: item statuses, aggregate counts and lifecycle.
//!
//! - [`FacilityStateTracker`] owns per-item statuses
//! - [`ProgressAggregator`] derives counts and detects completion once
//! - [`BatchLifecycle`] guards single-flight submission

mod aggregator;
mod lifecycle;
mod tracker;
mod types;

pub use aggregator::ProgressAggregator;
pub use lifecycle::{Acceptance, BatchLifecycle};
pub use tracker::{FacilityStateTracker, SnapshotEntry, TrackerSnapshot};
pub use types::{
    BatchCounts, BatchItem, DownloadStatus, FacilityRecord, ItemOutcome, StatusChange,
};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("batch has no items")]
    EmptyBatch,

    #[error("a batch is already {0}")]
    Busy(&'static str),

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// The session's single download batch.
///
/// Written only by the orchestrator; the aggregator and display read it.
#[derive(Debug, Default)]
pub struct DownloadBatch {
    pub lifecycle: BatchLifecycle,
    pub tracker: FacilityStateTracker,
    pub aggregator: ProgressAggregator,
}

impl DownloadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> BatchCounts {
        self.aggregator.counts(&self.tracker)
    }

    /// Drop all tracked items and return to idle.
    pub fn reset(&mut self) {
        self.lifecycle.reset();
        self.tracker.clear();
        self.aggregator.reset();
    }
}
