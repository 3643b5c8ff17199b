//! Progress feed message types.

use serde::{Deserialize, Serialize};

/// Reference to a batch item inside a progress notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(alias = "inspection_id")]
    pub identifier: String,
}

impl ItemRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// One asynchronous progress notice from the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<ItemRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<ItemRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed: Option<ItemRef>,
}

impl ProgressEvent {
    pub fn started(identifier: impl Into<String>) -> Self {
        Self {
            last_started: Some(ItemRef::new(identifier)),
            ..Default::default()
        }
    }

    pub fn completed(identifier: impl Into<String>) -> Self {
        Self {
            last_completed: Some(ItemRef::new(identifier)),
            ..Default::default()
        }
    }

    pub fn failed(identifier: impl Into<String>) -> Self {
        Self {
            last_failed: Some(ItemRef::new(identifier)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.last_started.is_none() && self.last_completed.is_none() && self.last_failed.is_none()
    }
}

/// An item delivered on the progress channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    Progress(ProgressEvent),
    /// The backend reports that no batch is running.
    BackendIdle,
}

impl From<ProgressEvent> for FeedMessage {
    fn from(event: ProgressEvent) -> Self {
        FeedMessage::Progress(event)
    }
}
