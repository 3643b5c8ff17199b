//! Display that records every call for assertions.

use std::sync::{Mutex, MutexGuard};

use crate::batch::{DownloadStatus, FacilityRecord};
use crate::dates::CalendarDate;
use crate::display::{DisplaySync, NoticeOptions, TriggerState};

/// A recorded display call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    /// Identifiers (or names, when a record has none) of the rendered rows.
    RenderRows(Vec<String>),
    ClearRows,
    SetRowStatus {
        identifier: String,
        status: DownloadStatus,
    },
    ShowNotice {
        message: String,
        options: NoticeOptions,
    },
    HideNotice,
    SetCounts {
        found: usize,
        saved: usize,
    },
    SetSelectedDate(String),
    SetDownloadTrigger(TriggerState),
}

/// Mock implementation of the DisplaySync trait.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<DisplayCall>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DisplayCall>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: DisplayCall) {
        self.lock().push(call);
    }

    /// All calls in order.
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.lock().clone()
    }

    /// Messages of every notice shown, in order.
    pub fn notices(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                DisplayCall::ShowNotice { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent trigger state, if any was set.
    pub fn last_trigger(&self) -> Option<TriggerState> {
        self.lock().iter().rev().find_map(|call| match call {
            DisplayCall::SetDownloadTrigger(state) => Some(*state),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DisplaySync for RecordingDisplay {
    fn render_rows(&self, records: &[FacilityRecord]) {
        let rows = records
            .iter()
            .map(|r| r.identifier().unwrap_or_else(|| r.name.clone()))
            .collect();
        self.record(DisplayCall::RenderRows(rows));
    }

    fn clear_rows(&self) {
        self.record(DisplayCall::ClearRows);
    }

    fn set_row_status(&self, identifier: &str, status: DownloadStatus) {
        self.record(DisplayCall::SetRowStatus {
            identifier: identifier.to_string(),
            status,
        });
    }

    fn show_notice(&self, message: &str, options: NoticeOptions) {
        self.record(DisplayCall::ShowNotice {
            message: message.to_string(),
            options,
        });
    }

    fn hide_notice(&self) {
        self.record(DisplayCall::HideNotice);
    }

    fn set_counts(&self, found: usize, saved: usize) {
        self.record(DisplayCall::SetCounts { found, saved });
    }

    fn set_selected_date(&self, date: &CalendarDate) {
        self.record(DisplayCall::SetSelectedDate(date.to_string()));
    }

    fn set_download_trigger(&self, state: TriggerState) {
        self.record(DisplayCall::SetDownloadTrigger(state));
    }
}
