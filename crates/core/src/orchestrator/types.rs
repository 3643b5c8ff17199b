//! Types for the download orchestrator.

use serde::Serialize;
use uuid::Uuid;

use crate::batch::{BatchCounts, BatchLifecycle};

/// Non-error result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The backend accepted the batch; progress events will complete it.
    Accepted { batch_id: Uuid, counts: BatchCounts },
    /// The backend reported another batch already running.
    RemoteBusy { batch_id: Uuid, message: String },
}

impl SubmitOutcome {
    pub fn batch_id(&self) -> Uuid {
        match self {
            SubmitOutcome::Accepted { batch_id, .. }
            | SubmitOutcome::RemoteBusy { batch_id, .. } => *batch_id,
        }
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStatus {
    pub lifecycle: BatchLifecycle,
    pub counts: BatchCounts,
    pub percentage: u8,
}
