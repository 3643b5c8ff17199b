//! Types for the dashboard backend API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::{BatchItem, DownloadStatus, FacilityRecord};
use crate::dates::CalendarDate;
use crate::progress::ItemRef;

/// Errors that can occur talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The backend answered 2xx but reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Accepts download batches for asynchronous processing.
#[async_trait]
pub trait SubmissionApi: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResponse, ApiError>;
}

/// Read-only report queries.
#[async_trait]
pub trait ReportsApi: Send + Sync {
    /// Reports already in storage for a date.
    async fn saved_for_date(&self, date: &CalendarDate) -> Result<Vec<FacilityRecord>, ApiError>;

    /// Search the inspection source for a date, flagging saved facilities.
    async fn search_date(&self, date: &CalendarDate) -> Result<SearchResults, ApiError>;
}

/// Snapshot source for the progress poller.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    async fn fetch_progress(&self) -> Result<ProgressSnapshot, ApiError>;
}

// ============================================================================
// Submission
// ============================================================================

/// One facility in a submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntry {
    pub identifier: String,
    #[serde(flatten)]
    pub facility: FacilityRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub facilities: Vec<SubmissionEntry>,
}

impl SubmissionRequest {
    /// Build a request preserving item order.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a BatchItem>) -> Self {
        let facilities = items
            .into_iter()
            .map(|item| {
                let mut facility = item.facility().clone();
                facility.name = item.name().to_string();
                SubmissionEntry {
                    identifier: item.identifier().to_string(),
                    facility,
                }
            })
            .collect();
        Self { facilities }
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}

/// Structured codes the backend attaches to submission responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseCode {
    #[serde(rename = "ALREADY_RUNNING")]
    AlreadyRunning,
    #[serde(other)]
    Other,
}

/// Per-run results the backend attaches once a batch has been processed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ResponseCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub successful: usize,
    #[serde(default)]
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ResponseCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<DownloadResults>,
}

impl SubmissionResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn already_running(message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(ResponseCode::AlreadyRunning),
            message: Some(message.into()),
            results: None,
        }
    }

    /// True when the backend refused because another batch is running,
    /// whether reported at the top level or inside `results`.
    pub fn is_already_running(&self) -> bool {
        self.code == Some(ResponseCode::AlreadyRunning)
            || self
                .results
                .as_ref()
                .is_some_and(|r| r.code == Some(ResponseCode::AlreadyRunning))
    }

    /// The most specific message in the response.
    pub fn message(&self) -> Option<&str> {
        self.results
            .as_ref()
            .and_then(|r| r.message.as_deref())
            .or(self.message.as_deref())
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SavedReportsResponse {
    pub success: bool,
    #[serde(default)]
    pub facilities: Vec<FacilityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub start_date: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub facilities: Vec<FacilityRecord>,
    #[serde(default)]
    pub total_reports: usize,
    #[serde(default)]
    pub duplicate_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Search outcome for one date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub facilities: Vec<FacilityRecord>,
    pub total_reports: usize,
    /// Facilities already present in storage.
    pub duplicate_count: usize,
}

impl From<SearchResponse> for SearchResults {
    fn from(response: SearchResponse) -> Self {
        Self {
            facilities: response.facilities,
            total_reports: response.total_reports,
            duplicate_count: response.duplicate_count,
        }
    }
}

// ============================================================================
// Progress
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    #[serde(default)]
    pub progress: Option<ProgressSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Backend-side view of the running batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub completed_count: usize,
    #[serde(default)]
    pub failed_count: usize,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub facilities: Vec<FacilityProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<ItemRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<ItemRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed: Option<ItemRef>,
}

impl ProgressSnapshot {
    /// Identifies the backend run this snapshot describes, if the backend says.
    pub fn run_key(&self) -> Option<&str> {
        self.job_id.as_deref().or(self.start_time.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FacilityProgress {
    #[serde(alias = "identifier")]
    pub inspection_id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FacilityProgress {
    pub fn new(inspection_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            inspection_id: inspection_id.into(),
            name: String::new(),
            status: status.into(),
            message: None,
        }
    }

    /// Map the backend status string onto the tracker's status.
    ///
    /// `extracting` is a sub-phase of downloading. Unknown strings yield `None`.
    pub fn download_status(&self) -> Option<DownloadStatus> {
        match self.status.as_str() {
            "pending" => Some(DownloadStatus::Pending),
            "downloading" | "extracting" => Some(DownloadStatus::Downloading),
            "completed" => Some(DownloadStatus::Completed),
            "failed" => Some(DownloadStatus::Failed),
            _ => None,
        }
    }
}
