//! Mock backend for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{
    ApiError, ProgressSnapshot, ProgressSource, ReportsApi, SearchResults, SubmissionApi,
    SubmissionRequest, SubmissionResponse,
};
use crate::batch::FacilityRecord;
use crate::dates::CalendarDate;

/// Mock implementation of every backend collaborator.
///
/// Provides controllable behavior for testing:
/// - Queue submission responses (default: accepted)
/// - Configure saved reports, search results and progress snapshots
/// - Record every request for assertions
/// - Fail the next call of any kind
///
/// # Example
///
/// ```rust,ignore
/// use poolscout_core::testing::{MockBackend, fixtures};
///
/// let backend = MockBackend::new();
/// backend.set_saved_reports(vec![fixtures::facility("Lakeside", "A")]).await;
///
/// let records = backend.saved_for_date(&date).await?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(backend.recorded_saved_queries().await, vec![date]);
/// ```
#[derive(Debug, Default)]
pub struct MockBackend {
    /// Queued submission responses.
    submit_responses: Arc<RwLock<VecDeque<SubmissionResponse>>>,
    /// Recorded submissions.
    submissions: Arc<RwLock<Vec<SubmissionRequest>>>,
    /// Saved reports returned for every date.
    saved_reports: Arc<RwLock<Vec<FacilityRecord>>>,
    /// Recorded saved-report queries.
    saved_queries: Arc<RwLock<Vec<CalendarDate>>>,
    /// Search results returned for every date.
    search_results: Arc<RwLock<SearchResults>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<CalendarDate>>>,
    /// Queued progress snapshots; the last one repeats once the queue drains.
    progress: Arc<RwLock<VecDeque<ProgressSnapshot>>>,
    last_progress: Arc<RwLock<ProgressSnapshot>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<ApiError>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an error to return on the next call.
    pub async fn set_next_error(&self, error: ApiError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<ApiError> {
        self.next_error.write().await.take()
    }

    /// Queue a response for a future submission.
    pub async fn push_submit_response(&self, response: SubmissionResponse) {
        self.submit_responses.write().await.push_back(response);
    }

    pub async fn recorded_submissions(&self) -> Vec<SubmissionRequest> {
        self.submissions.read().await.clone()
    }

    pub async fn set_saved_reports(&self, records: Vec<FacilityRecord>) {
        *self.saved_reports.write().await = records;
    }

    pub async fn recorded_saved_queries(&self) -> Vec<CalendarDate> {
        self.saved_queries.read().await.clone()
    }

    pub async fn set_search_results(&self, results: SearchResults) {
        *self.search_results.write().await = results;
    }

    pub async fn recorded_searches(&self) -> Vec<CalendarDate> {
        self.searches.read().await.clone()
    }

    /// Queue a progress snapshot.
    pub async fn push_progress(&self, snapshot: ProgressSnapshot) {
        self.progress.write().await.push_back(snapshot);
    }

    /// Clear all recorded requests.
    pub async fn clear_recorded(&self) {
        self.submissions.write().await.clear();
        self.saved_queries.write().await.clear();
        self.searches.write().await.clear();
    }
}

#[async_trait]
impl SubmissionApi for MockBackend {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResponse, ApiError> {
        self.submissions.write().await.push(request.clone());
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self
            .submit_responses
            .write()
            .await
            .pop_front()
            .unwrap_or_else(SubmissionResponse::accepted))
    }
}

#[async_trait]
impl ReportsApi for MockBackend {
    async fn saved_for_date(&self, date: &CalendarDate) -> Result<Vec<FacilityRecord>, ApiError> {
        self.saved_queries.write().await.push(*date);
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.saved_reports.read().await.clone())
    }

    async fn search_date(&self, date: &CalendarDate) -> Result<SearchResults, ApiError> {
        self.searches.write().await.push(*date);
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.search_results.read().await.clone())
    }
}

#[async_trait]
impl ProgressSource for MockBackend {
    async fn fetch_progress(&self) -> Result<ProgressSnapshot, ApiError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        let next = self.progress.write().await.pop_front();
        match next {
            Some(snapshot) => {
                *self.last_progress.write().await = snapshot.clone();
                Ok(snapshot)
            }
            None => Ok(self.last_progress.read().await.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn date() -> CalendarDate {
        CalendarDate::parse("2024-03-05").unwrap()
    }

    #[tokio::test]
    async fn test_submit_defaults_to_accepted() {
        let backend = MockBackend::new();
        let response = backend.submit(&SubmissionRequest::default()).await.unwrap();
        assert!(response.success);
        assert_eq!(backend.recorded_submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_next_error_applies_once() {
        let backend = MockBackend::new();
        backend.set_next_error(ApiError::Timeout).await;
        assert!(backend.saved_for_date(&date()).await.is_err());
        assert!(backend.saved_for_date(&date()).await.is_ok());
        assert_eq!(backend.recorded_saved_queries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_progress_repeats_last_snapshot() {
        let backend = MockBackend::new();
        backend
            .push_progress(fixtures::progress(true, &[("a", "downloading")]))
            .await;

        let first = backend.fetch_progress().await.unwrap();
        let second = backend.fetch_progress().await.unwrap();
        assert_eq!(first, second);
        assert!(second.is_active);
    }
}
