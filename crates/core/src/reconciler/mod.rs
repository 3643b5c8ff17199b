//! Page state reconciler.
//!
//! Re-derives the displayed found/saved counts and result rows from the
//! backend's storage instead of from in-memory assumptions.

mod types;

pub use types::PageCounts;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::ReportsApi;
use crate::batch::FacilityRecord;
use crate::dates::CalendarDate;
use crate::display::{DateInput, DisplaySync, NoticeOptions};
use crate::error::DashboardError;
use crate::metrics;

/// Keeps displayed counts and rows in line with stored reports.
pub struct PageStateReconciler {
    reports: Arc<dyn ReportsApi>,
    display: Arc<dyn DisplaySync>,
    input: Arc<dyn DateInput>,
    counts: RwLock<PageCounts>,
}

impl PageStateReconciler {
    pub fn new(
        reports: Arc<dyn ReportsApi>,
        display: Arc<dyn DisplaySync>,
        input: Arc<dyn DateInput>,
    ) -> Self {
        Self {
            reports,
            display,
            input,
            counts: RwLock::new(PageCounts::default()),
        }
    }

    /// Counts as last published to the display.
    pub async fn counts(&self) -> PageCounts {
        *self.counts.read().await
    }

    /// Reload saved reports for `date` and publish them.
    ///
    /// The found count is left as the last search set it. On failure an
    /// error notice is shown and both counts are cleared.
    pub async fn refresh_for_date(&self, date: &str) -> Result<PageCounts, DashboardError> {
        self.refresh(date, true).await
    }

    /// Re-run [`refresh_for_date`](Self::refresh_for_date) for the currently
    /// selected date. Failures are logged only.
    pub async fn refresh_current_state(&self) -> Option<PageCounts> {
        let Some(date) = self.input.selected_date() else {
            debug!("No date selected, skipping reconciliation");
            return None;
        };

        match self.refresh(&date, false).await {
            Ok(counts) => Some(counts),
            Err(e) => {
                warn!("Background reconciliation for {} failed: {}", date, e);
                None
            }
        }
    }

    /// Search `date`, publish found and saved counts, and render the rows.
    pub async fn search_date(&self, date: &str) -> Result<Vec<FacilityRecord>, DashboardError> {
        let date = CalendarDate::parse(date)?;

        let results = match self.reports.search_date(&date).await {
            Ok(results) => results,
            Err(e) => {
                let err = DashboardError::from(e);
                warn!("Search for {} failed: {}", date, err);
                self.display
                    .show_notice(&err.user_message(), NoticeOptions::plain());
                return Err(err);
            }
        };

        let counts = PageCounts {
            found: results.facilities.len(),
            saved: results.facilities.iter().filter(|f| f.saved).count(),
        };
        *self.counts.write().await = counts;

        info!(
            "Search for {} found {} facilities ({} saved)",
            date, counts.found, counts.saved
        );
        self.display.set_selected_date(&date);
        self.display.set_counts(counts.found, counts.saved);
        if results.facilities.is_empty() {
            self.display.clear_rows();
        } else {
            self.display.render_rows(&results.facilities);
        }

        Ok(results.facilities)
    }

    async fn refresh(&self, date: &str, surface: bool) -> Result<PageCounts, DashboardError> {
        let date = match CalendarDate::parse(date) {
            Ok(date) => date,
            Err(e) => {
                metrics::RECONCILIATIONS.with_label_values(&[e.kind()]).inc();
                return Err(e);
            }
        };

        match self.reports.saved_for_date(&date).await {
            Ok(records) => {
                let counts = {
                    let mut counts = self.counts.write().await;
                    counts.saved = records.len();
                    *counts
                };

                debug!("{} saved reports for {}", counts.saved, date);
                self.display.set_selected_date(&date);
                self.display.set_counts(counts.found, counts.saved);
                if counts.saved > 0 {
                    self.display.render_rows(&records);
                } else {
                    self.display.clear_rows();
                }

                metrics::RECONCILIATIONS.with_label_values(&["ok"]).inc();
                Ok(counts)
            }
            Err(e) => {
                let err = DashboardError::from(e);
                metrics::RECONCILIATIONS.with_label_values(&[err.kind()]).inc();

                *self.counts.write().await = PageCounts::default();
                self.display.set_counts(0, 0);
                if surface {
                    self.display
                        .show_notice(&err.user_message(), NoticeOptions::plain());
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ApiError, SearchResults};
    use crate::display::SelectedDate;
    use crate::testing::{fixtures, DisplayCall, MockBackend, RecordingDisplay};

    struct Harness {
        backend: Arc<MockBackend>,
        display: Arc<RecordingDisplay>,
        input: Arc<SelectedDate>,
        reconciler: PageStateReconciler,
    }

    fn harness() -> Harness {
        let backend = Arc::new(MockBackend::new());
        let display = Arc::new(RecordingDisplay::new());
        let input = Arc::new(SelectedDate::new());
        let reconciler = PageStateReconciler::new(backend.clone(), display.clone(), input.clone());
        Harness {
            backend,
            display,
            input,
            reconciler,
        }
    }

    #[tokio::test]
    async fn test_invalid_date_fails_without_side_effects() {
        let h = harness();
        let rejected = || {
            metrics::RECONCILIATIONS
                .with_label_values(&["validation"])
                .get()
        };
        let before = rejected();
        let err = h.reconciler.refresh_for_date("2024-13-40").await.unwrap_err();

        assert!(matches!(err, DashboardError::Validation(_)));
        assert!(rejected() > before);
        assert!(h.display.calls().is_empty());
        assert!(h.backend.recorded_saved_queries().await.is_empty());
        assert_eq!(h.reconciler.counts().await, PageCounts::default());
    }

    #[tokio::test]
    async fn test_zero_records_clears_rows() {
        let h = harness();
        let counts = h.reconciler.refresh_for_date("2024-03-05").await.unwrap();

        assert_eq!(counts.saved, 0);
        let calls = h.display.calls();
        assert!(calls.contains(&DisplayCall::ClearRows));
        assert!(calls.contains(&DisplayCall::SetCounts { found: 0, saved: 0 }));
        assert!(!calls
            .iter()
            .any(|c| matches!(c, DisplayCall::RenderRows(_))));
    }

    #[tokio::test]
    async fn test_saved_records_render_and_keep_found() {
        let h = harness();
        h.backend
            .set_search_results(SearchResults {
                facilities: vec![
                    fixtures::facility("Pool A", "A").with_saved(true),
                    fixtures::facility("Pool B", "B"),
                    fixtures::facility("Pool C", "C"),
                ],
                total_reports: 3,
                duplicate_count: 1,
            })
            .await;
        h.reconciler.search_date("2024-03-05").await.unwrap();
        assert_eq!(h.reconciler.counts().await, PageCounts { found: 3, saved: 1 });

        h.backend
            .set_saved_reports(vec![
                fixtures::facility("Pool A", "A").with_saved(true),
                fixtures::facility("Pool B", "B").with_saved(true),
            ])
            .await;
        h.display.clear();
        let counts = h.reconciler.refresh_for_date("2024-03-05").await.unwrap();

        assert_eq!(counts, PageCounts { found: 3, saved: 2 });
        let calls = h.display.calls();
        assert!(calls.contains(&DisplayCall::SetCounts { found: 3, saved: 2 }));
        assert!(calls.contains(&DisplayCall::RenderRows(vec!["A".into(), "B".into()])));
        assert!(calls.contains(&DisplayCall::SetSelectedDate("2024-03-05".into())));
    }

    #[tokio::test]
    async fn test_failure_surfaces_notice_and_clears_counts() {
        let h = harness();
        h.backend.set_saved_reports(vec![fixtures::facility("Pool A", "A")]).await;
        h.reconciler.refresh_for_date("2024-03-05").await.unwrap();

        h.backend
            .set_next_error(ApiError::ConnectionFailed("connection refused".into()))
            .await;
        let err = h.reconciler.refresh_for_date("2024-03-05").await.unwrap_err();

        assert!(matches!(err, DashboardError::Network(_)));
        assert_eq!(h.reconciler.counts().await, PageCounts::default());
        assert!(h.display.notices().iter().any(|n| n.contains("Could not reach")));
    }

    #[tokio::test]
    async fn test_refresh_current_state_is_silent_on_failure() {
        let h = harness();
        assert!(h.reconciler.refresh_current_state().await.is_none());

        h.input.select("2024-03-05");
        h.backend
            .set_next_error(ApiError::Http {
                status: 500,
                message: "boom".into(),
            })
            .await;
        assert!(h.reconciler.refresh_current_state().await.is_none());
        assert!(h.display.notices().is_empty());

        h.backend.set_saved_reports(vec![fixtures::facility("Pool A", "A")]).await;
        let counts = h.reconciler.refresh_current_state().await.unwrap();
        assert_eq!(counts.saved, 1);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_date() {
        let h = harness();
        assert!(matches!(
            h.reconciler.search_date("03/05/2024").await,
            Err(DashboardError::Validation(_))
        ));
        assert!(h.display.calls().is_empty());
    }
}
