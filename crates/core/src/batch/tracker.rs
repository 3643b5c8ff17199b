//! Facility state tracker: per-batch map from identifier to download status.
//!
//! Pure state with no I/O. Requests that would move an item backward, touch
//! a terminal item, or name an unknown identifier are ignored.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::types::{BatchItem, DownloadStatus, ItemOutcome, StatusChange};
use super::BatchError;

#[derive(Debug, Clone, PartialEq)]
struct TrackedItem {
    item: BatchItem,
    status: DownloadStatus,
}

/// One row of a tracker snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub identifier: String,
    pub name: String,
    pub status: DownloadStatus,
}

/// Read-only view of every tracked item, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl TrackerSnapshot {
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotEntry> {
        self.entries.iter()
    }

    /// Status of an item, if tracked.
    pub fn status(&self, identifier: &str) -> Option<DownloadStatus> {
        self.entries
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| e.status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of items currently in the given status.
    pub fn count(&self, status: DownloadStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

/// Tracks the download status of every item in the active batch.
#[derive(Debug, Clone, Default)]
pub struct FacilityStateTracker {
    items: Vec<TrackedItem>,
    index: HashMap<String, usize>,
}

impl FacilityStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked set; every item starts `Pending`.
    ///
    /// Duplicate identifiers keep their first occurrence.
    pub fn initialize(&mut self, items: Vec<BatchItem>) -> Result<(), BatchError> {
        if items.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        self.clear();
        for item in items {
            if self.index.contains_key(item.identifier()) {
                warn!(
                    "Dropping duplicate batch item {} ({})",
                    item.identifier(),
                    item.name()
                );
                continue;
            }
            self.index
                .insert(item.identifier().to_string(), self.items.len());
            self.items.push(TrackedItem {
                item,
                status: DownloadStatus::Pending,
            });
        }

        debug!("Tracker initialized with {} items", self.items.len());
        Ok(())
    }

    /// Record a terminal outcome for an item.
    pub fn transition(&mut self, identifier: &str, outcome: ItemOutcome) -> Option<StatusChange> {
        self.advance(identifier, outcome.into())
    }

    /// Move a pending item to `Downloading`.
    pub fn mark_downloading(&mut self, identifier: &str) -> Option<StatusChange> {
        self.advance(identifier, DownloadStatus::Downloading)
    }

    fn advance(&mut self, identifier: &str, next: DownloadStatus) -> Option<StatusChange> {
        let Some(&idx) = self.index.get(identifier) else {
            debug!("Ignoring {} for unknown item {}", next, identifier);
            return None;
        };
        let tracked = &mut self.items[idx];
        let previous = tracked.status;

        if previous.is_terminal() || next.rank() <= previous.rank() {
            debug!(
                "Ignoring {} for item {} already {}",
                next, identifier, previous
            );
            return None;
        }

        tracked.status = next;
        debug!("Item {}: {} -> {}", identifier, previous, next);
        Some(StatusChange {
            identifier: identifier.to_string(),
            previous,
            current: next,
        })
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            entries: self
                .items
                .iter()
                .map(|t| SnapshotEntry {
                    identifier: t.item.identifier().to_string(),
                    name: t.item.name().to_string(),
                    status: t.status,
                })
                .collect(),
        }
    }

    pub fn status(&self, identifier: &str) -> Option<DownloadStatus> {
        self.index.get(identifier).map(|&idx| self.items[idx].status)
    }

    /// Tracked items, in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().map(|t| &t.item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FacilityRecord;

    fn item(id: &str) -> BatchItem {
        BatchItem::new(id, format!("Facility {}", id), FacilityRecord::named(id))
    }

    fn tracker_with(ids: &[&str]) -> FacilityStateTracker {
        let mut tracker = FacilityStateTracker::new();
        tracker
            .initialize(ids.iter().map(|id| item(id)).collect())
            .unwrap();
        tracker
    }

    #[test]
    fn test_initialize_sets_all_pending() {
        let tracker = tracker_with(&["a", "b", "c"]);
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|e| e.status == DownloadStatus::Pending));
        assert_eq!(snapshot.count(DownloadStatus::Completed), 0);
        assert_eq!(snapshot.count(DownloadStatus::Failed), 0);
    }

    #[test]
    fn test_initialize_empty_fails() {
        let mut tracker = FacilityStateTracker::new();
        assert_eq!(tracker.initialize(vec![]), Err(BatchError::EmptyBatch));
    }

    #[test]
    fn test_initialize_replaces_previous_batch() {
        let mut tracker = tracker_with(&["a", "b"]);
        tracker.transition("a", ItemOutcome::Completed);

        tracker.initialize(vec![item("c")]).unwrap();
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.status("a"), None);
        assert_eq!(tracker.status("c"), Some(DownloadStatus::Pending));
    }

    #[test]
    fn test_initialize_drops_duplicates() {
        let tracker = tracker_with(&["a", "b", "a"]);
        assert_eq!(tracker.len(), 2);
        let ids: Vec<_> = tracker.items().map(|i| i.identifier().to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_transition_returns_change() {
        let mut tracker = tracker_with(&["a"]);
        let change = tracker.transition("a", ItemOutcome::Failed).unwrap();
        assert_eq!(change.identifier, "a");
        assert_eq!(change.previous, DownloadStatus::Pending);
        assert_eq!(change.current, DownloadStatus::Failed);
    }

    #[test]
    fn test_transition_unknown_is_noop() {
        let mut tracker = tracker_with(&["a", "b"]);
        let before = tracker.snapshot();
        assert!(tracker.transition("zzz", ItemOutcome::Completed).is_none());
        assert_eq!(tracker.snapshot(), before);
    }

    #[test]
    fn test_terminal_items_are_frozen() {
        let mut tracker = tracker_with(&["a"]);
        tracker.transition("a", ItemOutcome::Completed).unwrap();

        assert!(tracker.transition("a", ItemOutcome::Failed).is_none());
        assert!(tracker.transition("a", ItemOutcome::Completed).is_none());
        assert!(tracker.mark_downloading("a").is_none());
        assert_eq!(tracker.status("a"), Some(DownloadStatus::Completed));
    }

    #[test]
    fn test_downloading_is_monotonic() {
        let mut tracker = tracker_with(&["a"]);
        let change = tracker.mark_downloading("a").unwrap();
        assert_eq!(change.previous, DownloadStatus::Pending);

        assert!(tracker.mark_downloading("a").is_none());
        let change = tracker.transition("a", ItemOutcome::Completed).unwrap();
        assert_eq!(change.previous, DownloadStatus::Downloading);
    }

    #[test]
    fn test_finished_never_exceeds_total() {
        let mut tracker = tracker_with(&["a", "b", "c"]);
        let events = [
            ("a", ItemOutcome::Completed),
            ("a", ItemOutcome::Failed),
            ("b", ItemOutcome::Failed),
            ("x", ItemOutcome::Completed),
            ("c", ItemOutcome::Completed),
            ("c", ItemOutcome::Completed),
        ];
        for (id, outcome) in events {
            tracker.transition(id, outcome);
            let snap = tracker.snapshot();
            let finished =
                snap.count(DownloadStatus::Completed) + snap.count(DownloadStatus::Failed);
            assert!(finished <= snap.len());
        }
    }
}
