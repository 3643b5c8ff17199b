//! Download orchestrator.
//!
//! Gatekeeper for batch submission and the single writer of the session's
//! download batch:
//! - **Submission**: single-flight, skips saved facilities, resets on failure
//! - **Progress**: applies feed messages in arrival order
//! - **Finalization**: runs exactly once per batch, then reconciles the page

mod config;
mod runner;
mod types;

pub use config::ProgressConfig;
pub use runner::DownloadOrchestrator;
pub use types::{OrchestratorStatus, SubmitOutcome};
