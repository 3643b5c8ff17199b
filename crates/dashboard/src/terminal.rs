//! Terminal rendering of dashboard state.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

use colored::{ColoredString, Colorize};
use tracing::{debug, warn};

use poolscout_core::{
    CalendarDate, DisplaySync, DownloadStatus, FacilityRecord, NoticeOptions, TriggerState,
};

struct Screen {
    out: Box<dyn Write + Send>,
    /// Row names keyed by identifier, from the last render.
    names: HashMap<String, String>,
    /// Message of the notice currently shown.
    notice: Option<String>,
}

/// Line-oriented display on stdout (or any writer).
pub struct TerminalDisplay {
    screen: Mutex<Screen>,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            screen: Mutex::new(Screen {
                out,
                names: HashMap::new(),
                notice: None,
            }),
        }
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_line(screen: &mut Screen, line: impl std::fmt::Display) {
        if let Err(e) = writeln!(screen.out, "{}", line).and_then(|_| screen.out.flush()) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

fn status_badge(status: DownloadStatus) -> ColoredString {
    let label = format!("{:<11}", status.as_str());
    match status {
        DownloadStatus::Pending => label.dimmed(),
        DownloadStatus::Downloading => label.cyan(),
        DownloadStatus::Completed => label.green(),
        DownloadStatus::Failed => label.red().bold(),
    }
}

fn saved_badge(saved: bool) -> ColoredString {
    if saved {
        format!("{:<11}", "saved").green()
    } else {
        format!("{:<11}", "new").yellow()
    }
}

impl DisplaySync for TerminalDisplay {
    fn render_rows(&self, records: &[FacilityRecord]) {
        let mut screen = self.screen();
        screen.names.clear();
        for record in records {
            let identifier = record.identifier().unwrap_or_default();
            let line = format!(
                "  {} {:<40} {:<14} {}",
                saved_badge(record.saved),
                record.name,
                identifier,
                record.display_address.as_deref().unwrap_or("").bright_black()
            );
            Self::write_line(&mut screen, line);
            if !identifier.is_empty() {
                screen.names.insert(identifier, record.name.clone());
            }
        }
    }

    fn clear_rows(&self) {
        let mut screen = self.screen();
        screen.names.clear();
        Self::write_line(&mut screen, "  (no reports)".dimmed());
    }

    fn set_row_status(&self, identifier: &str, status: DownloadStatus) {
        let mut screen = self.screen();
        let name = screen
            .names
            .get(identifier)
            .cloned()
            .unwrap_or_else(|| identifier.to_string());
        Self::write_line(&mut screen, format!("  {} {}", status_badge(status), name));
    }

    fn show_notice(&self, message: &str, options: NoticeOptions) {
        let mut screen = self.screen();
        if screen.notice.as_deref() == Some(message) {
            return;
        }
        screen.notice = Some(message.to_string());

        let marker = if options.show_activity {
            "›".cyan()
        } else {
            "•".normal()
        };
        let line = match options.percentage {
            Some(pct) => format!("{} [{:>3}%] {}", marker, pct, message),
            None => format!("{} {}", marker, message),
        };
        Self::write_line(&mut screen, line);
    }

    fn hide_notice(&self) {
        self.screen().notice = None;
    }

    fn set_counts(&self, found: usize, saved: usize) {
        let mut screen = self.screen();
        let line = format!(
            "Found: {}  Saved: {}",
            found.to_string().bold(),
            saved.to_string().green()
        );
        Self::write_line(&mut screen, line);
    }

    fn set_selected_date(&self, date: &CalendarDate) {
        let mut screen = self.screen();
        let header = format!("Inspection reports for {}", date);
        Self::write_line(&mut screen, header.bold());
    }

    fn set_download_trigger(&self, state: TriggerState) {
        debug!("Download trigger is now {:?}", state);
    }
}
