//! Display sync boundary.
//!
//! The core services project batch and page state through [`DisplaySync`]
//! and read the selected date through [`DateInput`]. Implementations never
//! feed back into tracker state.

mod input;
mod noop;

pub use input::{DateInput, SelectedDate};
pub use noop::NoopDisplay;

use serde::{Deserialize, Serialize};

use crate::batch::{DownloadStatus, FacilityRecord};
use crate::dates::CalendarDate;

/// Presentation options for a notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeOptions {
    /// Show a busy indicator alongside the message.
    pub show_activity: bool,
    /// Progress bar value, 0-100.
    pub percentage: Option<u8>,
}

impl NoticeOptions {
    pub fn activity(percentage: u8) -> Self {
        Self {
            show_activity: true,
            percentage: Some(percentage),
        }
    }

    pub fn plain() -> Self {
        Self::default()
    }
}

/// State of the control that starts a batch download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    Idle,
    Busy,
}

/// Sink for everything the operator sees.
pub trait DisplaySync: Send + Sync {
    fn render_rows(&self, records: &[FacilityRecord]);

    fn clear_rows(&self);

    fn set_row_status(&self, identifier: &str, status: DownloadStatus);

    fn show_notice(&self, message: &str, options: NoticeOptions);

    fn hide_notice(&self);

    fn set_counts(&self, found: usize, saved: usize);

    fn set_selected_date(&self, date: &CalendarDate);

    fn set_download_trigger(&self, state: TriggerState);
}
