//! Progress feed: event types and the polling task that produces them.

mod poller;
mod types;

pub use poller::{ProgressPoller, SnapshotDiff};
pub use types::*;
