//! HTTP implementation of the backend collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::batch::FacilityRecord;
use crate::config::BackendConfig;
use crate::dates::CalendarDate;

use super::{
    ApiError, ProgressResponse, ProgressSnapshot, ProgressSource, ReportsApi,
    SavedReportsResponse, SearchRequest, SearchResponse, SearchResults, SubmissionApi,
    SubmissionRequest, SubmissionResponse,
};

/// Longest slice of a non-JSON error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

/// Dashboard backend client over HTTP.
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ConnectionFailed(format!("failed to build client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn map_send_error(e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::ConnectionFailed(e.to_string())
        }
    }

    /// Turn a non-2xx response into `ApiError::Http`, preferring the body's
    /// `message` or `error` field.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body.chars().take(MAX_ERROR_BODY).collect()
                }
            });

        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SubmissionApi for HttpBackend {
    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionResponse, ApiError> {
        let url = self.url(&self.config.submit_path);
        debug!("Submitting {} facilities to {}", request.len(), url);

        // The backend may answer only once the whole batch has downloaded.
        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.submit_timeout_secs))
            .json(request)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::parse_json(response).await
    }
}

#[async_trait]
impl ReportsApi for HttpBackend {
    async fn saved_for_date(&self, date: &CalendarDate) -> Result<Vec<FacilityRecord>, ApiError> {
        let url = format!(
            "{}/{}",
            self.url(self.config.saved_reports_path.trim_end_matches('/')),
            urlencoding::encode(&date.to_string())
        );
        debug!("Fetching saved reports from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let body: SavedReportsResponse = Self::parse_json(response).await?;
        if !body.success {
            return Err(ApiError::Rejected(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "failed to load saved reports".to_string()),
            ));
        }
        Ok(body.facilities)
    }

    async fn search_date(&self, date: &CalendarDate) -> Result<SearchResults, ApiError> {
        let url = self.url(&self.config.search_path);
        debug!("Searching {} for {}", url, date);

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                start_date: date.to_string(),
            })
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let body: SearchResponse = Self::parse_json(response).await?;
        if !body.success {
            return Err(ApiError::Rejected(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "search failed".to_string()),
            ));
        }
        Ok(body.into())
    }
}

#[async_trait]
impl ProgressSource for HttpBackend {
    async fn fetch_progress(&self) -> Result<ProgressSnapshot, ApiError> {
        let url = self.url(&self.config.progress_path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let body: ProgressResponse = Self::parse_json(response).await?;
        if !body.success {
            return Err(ApiError::Rejected(
                body.error
                    .or(body.message)
                    .unwrap_or_else(|| "progress unavailable".to_string()),
            ));
        }
        // A missing snapshot means nothing is running.
        Ok(body.progress.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpBackend::new(config("http://127.0.0.1:7001/")).unwrap();
        assert_eq!(
            backend.url("/api/v1/reports/download/start"),
            "http://127.0.0.1:7001/api/v1/reports/download/start"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_failed() {
        // Port 9 (discard) is not expected to be listening.
        let backend = HttpBackend::new(config("http://127.0.0.1:9")).unwrap();
        let result = backend.fetch_progress().await;
        assert!(matches!(
            result,
            Err(ApiError::ConnectionFailed(_)) | Err(ApiError::Timeout)
        ));
    }
}
