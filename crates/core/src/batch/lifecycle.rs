//! Explicit batch lifecycle replacing a bare in-flight flag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::BatchError;

/// How the backend answered the submission of an in-flight batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    /// Submitted, no answer yet.
    Pending,
    Accepted,
    /// The backend reported another batch already running.
    RemoteBusy,
}

/// Where the session's single batch currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchLifecycle {
    /// No batch is running; submissions are allowed.
    #[default]
    Idle,
    /// A batch was handed to the backend and is being tracked.
    InFlight {
        batch_id: Uuid,
        started_at: DateTime<Utc>,
        acceptance: Acceptance,
    },
    /// Completion was detected; cleanup is running.
    Finalizing { batch_id: Uuid },
}

impl BatchLifecycle {
    /// Idle → InFlight. Any other starting state is rejected.
    pub fn begin(&mut self) -> Result<Uuid, BatchError> {
        if *self != BatchLifecycle::Idle {
            return Err(BatchError::Busy(self.state_name()));
        }
        let batch_id = Uuid::new_v4();
        *self = BatchLifecycle::InFlight {
            batch_id,
            started_at: Utc::now(),
            acceptance: Acceptance::Pending,
        };
        Ok(batch_id)
    }

    /// Record the backend's answer for the in-flight batch.
    pub fn acknowledge(&mut self, answer: Acceptance) -> Result<(), BatchError> {
        match self {
            BatchLifecycle::InFlight { acceptance, .. } => {
                *acceptance = answer;
                Ok(())
            }
            other => Err(BatchError::InvalidTransition {
                from: other.state_name(),
                to: "acknowledged",
            }),
        }
    }

    /// InFlight → Finalizing.
    pub fn begin_finalizing(&mut self) -> Result<Uuid, BatchError> {
        match *self {
            BatchLifecycle::InFlight { batch_id, .. } => {
                *self = BatchLifecycle::Finalizing { batch_id };
                Ok(batch_id)
            }
            other => Err(BatchError::InvalidTransition {
                from: other.state_name(),
                to: "finalizing",
            }),
        }
    }

    /// Finalizing → Idle.
    pub fn finish(&mut self) -> Result<(), BatchError> {
        match *self {
            BatchLifecycle::Finalizing { .. } => {
                *self = BatchLifecycle::Idle;
                Ok(())
            }
            other => Err(BatchError::InvalidTransition {
                from: other.state_name(),
                to: "idle",
            }),
        }
    }

    /// Unconditionally return to Idle (submission failure or backend reset).
    pub fn reset(&mut self) {
        *self = BatchLifecycle::Idle;
    }

    /// True while a batch blocks new submissions.
    pub fn is_busy(&self) -> bool {
        !matches!(self, BatchLifecycle::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, BatchLifecycle::InFlight { .. })
    }

    pub fn acceptance(&self) -> Option<Acceptance> {
        match self {
            BatchLifecycle::InFlight { acceptance, .. } => Some(*acceptance),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.acceptance() == Some(Acceptance::Accepted)
    }

    pub fn batch_id(&self) -> Option<Uuid> {
        match self {
            BatchLifecycle::Idle => None,
            BatchLifecycle::InFlight { batch_id, .. } | BatchLifecycle::Finalizing { batch_id } => {
                Some(*batch_id)
            }
        }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            BatchLifecycle::Idle => "idle",
            BatchLifecycle::InFlight { .. } => "in_flight",
            BatchLifecycle::Finalizing { .. } => "finalizing",
        }
    }
}
