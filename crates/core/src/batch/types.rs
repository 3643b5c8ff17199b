//! Core batch data types.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Matches the inspection id embedded in report URLs.
static INSPECTION_ID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)inspectionID=([A-F0-9\-]{36})").unwrap());

// ============================================================================
// Status
// ============================================================================

/// Download status of a single batch item.
///
/// Ordered `Pending` → `Downloading` → {`Completed`, `Failed`}; the last two
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// Position along the monotonic order. Terminal states share a rank.
    pub fn rank(&self) -> u8 {
        match self {
            DownloadStatus::Pending => 0,
            DownloadStatus::Downloading => 1,
            DownloadStatus::Completed | DownloadStatus::Failed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }

    /// Returns the string representation for display and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome reported for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Completed,
    Failed,
}

impl From<ItemOutcome> for DownloadStatus {
    fn from(outcome: ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Completed => DownloadStatus::Completed,
            ItemOutcome::Failed => DownloadStatus::Failed,
        }
    }
}

// ============================================================================
// Facility records and batch items
// ============================================================================

/// A facility row as returned by search and saved-report queries.
///
/// Fields the dashboard does not interpret are kept in `extra` so they travel
/// back to the backend untouched on submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<i64>,
    /// Whether a report for this facility is already in storage.
    #[serde(default)]
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FacilityRecord {
    /// Create a record with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_inspection_id(mut self, id: impl Into<String>) -> Self {
        self.inspection_id = Some(id.into());
        self
    }

    pub fn with_pdf_url(mut self, url: impl Into<String>) -> Self {
        self.pdf_url = Some(url.into());
        self
    }

    pub fn with_saved(mut self, saved: bool) -> Self {
        self.saved = saved;
        self
    }

    /// Identifier used to track this facility in a batch.
    ///
    /// Prefers the explicit inspection id and falls back to the id embedded
    /// in the report URL.
    pub fn identifier(&self) -> Option<String> {
        if let Some(id) = self.inspection_id.as_deref().map(str::trim) {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }

        let url = self.pdf_url.as_deref()?;
        INSPECTION_ID_PARAM
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// One facility queued for download. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    identifier: String,
    name: String,
    facility: FacilityRecord,
}

impl BatchItem {
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        facility: FacilityRecord,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            facility,
        }
    }

    /// Build an item from a facility record, if it carries an identifier.
    pub fn from_facility(facility: FacilityRecord) -> Option<Self> {
        let identifier = facility.identifier()?;
        let name = if facility.name.trim().is_empty() {
            "Unknown".to_string()
        } else {
            facility.name.clone()
        };
        Some(Self {
            identifier,
            name,
            facility,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn facility(&self) -> &FacilityRecord {
        &self.facility
    }

    /// Whether the originating facility is already saved.
    pub fn is_saved(&self) -> bool {
        self.facility.saved
    }
}

// ============================================================================
// Observations
// ============================================================================

/// A status change applied by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub identifier: String,
    pub previous: DownloadStatus,
    pub current: DownloadStatus,
}

/// Aggregate counters for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Items still pending or downloading.
    pub remaining: usize,
}

impl BatchCounts {
    /// Number of items in a terminal state.
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }

    /// Share of finished items, rounded to a whole percentage.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.finished() * 100 + self.total / 2) / self.total).min(100) as u8
    }
}
