//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the backend collaborators
//! and the display boundary, so the core services can be exercised without
//! a running backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use poolscout_core::testing::{fixtures, MockBackend, RecordingDisplay};
//!
//! let backend = Arc::new(MockBackend::new());
//! let display = Arc::new(RecordingDisplay::new());
//!
//! backend.push_submit_response(SubmissionResponse::already_running("busy")).await;
//! orchestrator.submit(fixtures::batch_items(&["a", "b"])).await?;
//!
//! assert!(display.notices().iter().any(|n| n == "busy"));
//! ```

mod mock_backend;
mod recording_display;

pub use mock_backend::MockBackend;
pub use recording_display::{DisplayCall, RecordingDisplay};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::backend::{FacilityProgress, ProgressSnapshot};
    use crate::batch::{BatchItem, FacilityRecord};

    /// Create a facility record with an inspection id and report URL.
    pub fn facility(name: &str, inspection_id: &str) -> FacilityRecord {
        FacilityRecord {
            display_address: Some("100 Main St, Sacramento CA".to_string()),
            inspection_date: Some("2024-03-05".to_string()),
            pdf_url: Some(format!(
                "https://inspections.example.test/report?inspectionID={}",
                inspection_id
            )),
            ..FacilityRecord::named(name).with_inspection_id(inspection_id)
        }
    }

    /// Create unsaved batch items, one per identifier.
    pub fn batch_items(ids: &[&str]) -> Vec<BatchItem> {
        ids.iter()
            .map(|id| {
                let name = format!("Facility {}", id);
                BatchItem::new(*id, name.clone(), facility(&name, id))
            })
            .collect()
    }

    /// Create a batch item whose report is already saved.
    pub fn saved_item(id: &str) -> BatchItem {
        let name = format!("Facility {}", id);
        BatchItem::new(id, name.clone(), facility(&name, id).with_saved(true))
    }

    /// Create a progress snapshot from `(identifier, status)` pairs.
    pub fn progress(active: bool, facilities: &[(&str, &str)]) -> ProgressSnapshot {
        let total = facilities.len();
        let completed = facilities.iter().filter(|(_, s)| *s == "completed").count();
        let failed = facilities.iter().filter(|(_, s)| *s == "failed").count();
        ProgressSnapshot {
            is_active: active,
            status: if active { "downloading" } else { "completed" }.to_string(),
            completed_count: completed,
            failed_count: failed,
            total_count: total,
            facilities: facilities
                .iter()
                .map(|(id, status)| FacilityProgress::new(*id, *status))
                .collect(),
            ..Default::default()
        }
    }
}
