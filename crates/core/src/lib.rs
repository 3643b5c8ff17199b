pub mod backend;
pub mod batch;
pub mod config;
pub mod dates;
pub mod display;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod reconciler;
pub mod testing;

pub use backend::{
    ApiError, HttpBackend, ProgressSnapshot, ProgressSource, ReportsApi, SearchResults,
    SubmissionApi, SubmissionRequest, SubmissionResponse,
};
pub use batch::{
    Acceptance, BatchCounts, BatchError, BatchItem, BatchLifecycle, DownloadBatch, DownloadStatus,
    FacilityRecord, FacilityStateTracker, ItemOutcome, ProgressAggregator, StatusChange,
    TrackerSnapshot,
};
pub use config::{
    load_config, load_config_from_str, validate_config, BackendConfig, Config, ConfigError,
    LogFormat, LoggingConfig,
};
pub use dates::CalendarDate;
pub use display::{DateInput, DisplaySync, NoopDisplay, NoticeOptions, SelectedDate, TriggerState};
pub use error::DashboardError;
pub use orchestrator::{DownloadOrchestrator, OrchestratorStatus, ProgressConfig, SubmitOutcome};
pub use progress::{FeedMessage, ItemRef, ProgressEvent, ProgressPoller};
pub use reconciler::{PageCounts, PageStateReconciler};
