use tracing::trace;

use crate::batch::{DownloadStatus, FacilityRecord};
use crate::dates::CalendarDate;

use super::{DisplaySync, NoticeOptions, TriggerState};

/// Display that discards every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDisplay;

impl DisplaySync for NoopDisplay {
    fn render_rows(&self, records: &[FacilityRecord]) {
        trace!("noop display: render {} rows", records.len());
    }

    fn clear_rows(&self) {}

    fn set_row_status(&self, _identifier: &str, _status: DownloadStatus) {}

    fn show_notice(&self, message: &str, _options: NoticeOptions) {
        trace!("noop display: notice '{}'", message);
    }

    fn hide_notice(&self) {}

    fn set_counts(&self, _found: usize, _saved: usize) {}

    fn set_selected_date(&self, _date: &CalendarDate) {}

    fn set_download_trigger(&self, _state: TriggerState) {}
}
