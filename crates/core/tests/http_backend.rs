//! HttpBackend against an in-process fake dashboard API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use poolscout_core::{
    ApiError, BackendConfig, BatchItem, CalendarDate, HttpBackend, ProgressSource, ReportsApi,
    SubmissionApi, SubmissionRequest,
};

/// Canned behavior and recorded bodies for the fake server.
#[derive(Default)]
struct FakeState {
    submit_reply: Mutex<Option<(StatusCode, Value)>>,
    submit_delay: Mutex<Option<Duration>>,
    submitted: Mutex<Vec<Value>>,
    searched: Mutex<Vec<Value>>,
}

async fn submit(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.submitted.lock().unwrap().push(body);
    let delay = *state.submit_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let (status, reply) = state
        .submit_reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or((StatusCode::OK, json!({"success": true})));
    (status, Json(reply))
}

async fn saved(Path(date): Path<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "facilities": [
            {"name": "Lakeside Apartments", "inspection_id": "A", "inspection_date": date, "saved": true}
        ]
    }))
}

async fn search(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Json<Value> {
    state.searched.lock().unwrap().push(body);
    Json(json!({
        "success": true,
        "search_date": "2024-03-05",
        "facilities": [
            {"name": "Lakeside Apartments", "inspection_id": "A", "saved": true},
            {"name": "Hilltop Club", "pdf_url": "https://x.test/r?inspectionID=0A1B2C3D-0000-1111-2222-333344445555", "saved": false}
        ],
        "total_reports": 2,
        "duplicate_count": 1
    }))
}

async fn progress() -> Json<Value> {
    Json(json!({
        "success": true,
        "progress": {
            "is_active": true,
            "status": "downloading",
            "completed_count": 1,
            "failed_count": 0,
            "total_count": 2,
            "facilities": [
                {"inspection_id": "A", "name": "Lakeside Apartments", "status": "completed"},
                {"inspection_id": "B", "name": "Hilltop Club", "status": "extracting"}
            ],
            "last_completed": {"inspection_id": "A"}
        }
    }))
}

async fn spawn_fake(state: Arc<FakeState>) -> String {
    let app = Router::new()
        .route("/api/v1/reports/download/start", post(submit))
        .route("/api/v1/reports/saved/{date}", get(saved))
        .route("/api/v1/reports/search-with-duplicates", post(search))
        .route("/api/v1/downloads/progress", get(progress))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(BackendConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..BackendConfig::default()
    })
    .unwrap()
}

fn request() -> SubmissionRequest {
    let items = vec![
        BatchItem::new("A", "Lakeside Apartments", Default::default()),
        BatchItem::new("B", "Hilltop Club", Default::default()),
    ];
    SubmissionRequest::from_items(&items)
}

#[tokio::test]
async fn test_submit_posts_facilities_in_order() {
    let state = Arc::new(FakeState::default());
    let base = spawn_fake(Arc::clone(&state)).await;

    let response = backend(&base).submit(&request()).await.unwrap();
    assert!(response.success);
    assert!(!response.is_already_running());

    let submitted = state.submitted.lock().unwrap().clone();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0]["facilities"][0]["identifier"], "A");
    assert_eq!(submitted[0]["facilities"][1]["name"], "Hilltop Club");
}

#[tokio::test]
async fn test_submit_reports_nested_already_running() {
    let state = Arc::new(FakeState::default());
    *state.submit_reply.lock().unwrap() = Some((
        StatusCode::OK,
        json!({
            "success": true,
            "results": {
                "success": false,
                "code": "ALREADY_RUNNING",
                "message": "Download already in progress by another worker.",
                "successful": 0,
                "failed": 0,
                "results": []
            }
        }),
    ));
    let base = spawn_fake(state).await;

    let response = backend(&base).submit(&request()).await.unwrap();
    assert!(response.is_already_running());
    assert_eq!(
        response.message(),
        Some("Download already in progress by another worker.")
    );
}

#[tokio::test]
async fn test_server_error_carries_body_message() {
    let state = Arc::new(FakeState::default());
    *state.submit_reply.lock().unwrap() = Some((
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"success": false, "message": "Download failed: disk full"}),
    ));
    let base = spawn_fake(state).await;

    match backend(&base).submit(&request()).await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Download failed: disk full");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_saved_reports_for_date() {
    let base = spawn_fake(Arc::new(FakeState::default())).await;
    let date = CalendarDate::parse("2024-03-05").unwrap();

    let records = backend(&base).saved_for_date(&date).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identifier().as_deref(), Some("A"));
    assert_eq!(records[0].inspection_date.as_deref(), Some("2024-03-05"));
}

#[tokio::test]
async fn test_search_sends_start_date() {
    let state = Arc::new(FakeState::default());
    let base = spawn_fake(Arc::clone(&state)).await;
    let date = CalendarDate::parse("2024-03-05").unwrap();

    let results = backend(&base).search_date(&date).await.unwrap();
    assert_eq!(results.total_reports, 2);
    assert_eq!(results.duplicate_count, 1);
    assert_eq!(
        results.facilities[1].identifier().as_deref(),
        Some("0A1B2C3D-0000-1111-2222-333344445555")
    );
    assert_eq!(
        state.searched.lock().unwrap()[0],
        json!({"start_date": "2024-03-05"})
    );
}

#[tokio::test]
async fn test_progress_snapshot() {
    let base = spawn_fake(Arc::new(FakeState::default())).await;

    let snapshot = backend(&base).fetch_progress().await.unwrap();
    assert!(snapshot.is_active);
    assert_eq!(snapshot.total_count, 2);
    assert_eq!(snapshot.facilities[1].status, "extracting");
    assert_eq!(
        snapshot.last_completed.map(|r| r.identifier),
        Some("A".to_string())
    );
}

#[tokio::test]
async fn test_submit_outlives_request_timeout() {
    let state = Arc::new(FakeState::default());
    *state.submit_delay.lock().unwrap() = Some(Duration::from_millis(1500));
    let base = spawn_fake(Arc::clone(&state)).await;

    let backend = HttpBackend::new(BackendConfig {
        base_url: base,
        timeout_secs: 1,
        submit_timeout_secs: 10,
        ..BackendConfig::default()
    })
    .unwrap();

    let response = backend.submit(&request()).await.unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn test_submit_timeout_still_applies() {
    let state = Arc::new(FakeState::default());
    *state.submit_delay.lock().unwrap() = Some(Duration::from_secs(3));
    let base = spawn_fake(Arc::clone(&state)).await;

    let backend = HttpBackend::new(BackendConfig {
        base_url: base,
        timeout_secs: 1,
        submit_timeout_secs: 1,
        ..BackendConfig::default()
    })
    .unwrap();

    let err = backend.submit(&request()).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
}
