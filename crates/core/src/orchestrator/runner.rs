//! Download orchestrator implementation.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{SubmissionApi, SubmissionRequest};
use crate::batch::{
    Acceptance, BatchCounts, BatchItem, BatchLifecycle, DownloadBatch, ItemOutcome,
    StatusChange, TrackerSnapshot,
};
use crate::display::{DisplaySync, NoticeOptions, TriggerState};
use crate::error::DashboardError;
use crate::metrics;
use crate::progress::{FeedMessage, ProgressEvent};
use crate::reconciler::PageStateReconciler;

use super::config::ProgressConfig;
use super::types::{OrchestratorStatus, SubmitOutcome};

const DEFAULT_BUSY_MESSAGE: &str = "A download is already in progress.";

/// The download orchestrator - owns the session's single download batch.
pub struct DownloadOrchestrator {
    config: ProgressConfig,
    submission: Arc<dyn SubmissionApi>,
    display: Arc<dyn DisplaySync>,
    reconciler: Arc<PageStateReconciler>,

    // Runtime state
    batch: RwLock<DownloadBatch>,
    lifecycle_tx: watch::Sender<BatchLifecycle>,
}

impl DownloadOrchestrator {
    pub fn new(
        config: ProgressConfig,
        submission: Arc<dyn SubmissionApi>,
        display: Arc<dyn DisplaySync>,
        reconciler: Arc<PageStateReconciler>,
    ) -> Self {
        let (lifecycle_tx, _) = watch::channel(BatchLifecycle::Idle);
        Self {
            config,
            submission,
            display,
            reconciler,
            batch: RwLock::new(DownloadBatch::new()),
            lifecycle_tx,
        }
    }

    /// Receiver that observes every lifecycle change.
    pub fn subscribe_lifecycle(&self) -> watch::Receiver<BatchLifecycle> {
        self.lifecycle_tx.subscribe()
    }

    /// Must be called with the batch write lock held, after any lifecycle mutation.
    fn publish(&self, lifecycle: BatchLifecycle) {
        self.lifecycle_tx.send_replace(lifecycle);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn lifecycle(&self) -> BatchLifecycle {
        self.batch.read().await.lifecycle
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.batch.read().await.tracker.snapshot()
    }

    pub async fn counts(&self) -> BatchCounts {
        self.batch.read().await.counts()
    }

    /// True from submission until finalization completes.
    pub async fn is_in_flight(&self) -> bool {
        self.batch.read().await.lifecycle.is_busy()
    }

    pub async fn status(&self) -> OrchestratorStatus {
        let batch = self.batch.read().await;
        let counts = batch.counts();
        OrchestratorStatus {
            lifecycle: batch.lifecycle,
            counts,
            percentage: counts.percentage(),
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit a batch built from `candidates`, skipping saved facilities.
    pub async fn submit(
        &self,
        candidates: Vec<BatchItem>,
    ) -> Result<SubmitOutcome, DashboardError> {
        let (batch_id, request) = {
            let mut batch = self.batch.write().await;

            if batch.lifecycle.is_busy() {
                let err = DashboardError::AlreadyRunning(format!(
                    "A download batch is already {}",
                    batch.lifecycle.state_name().replace('_', " ")
                ));
                metrics::BATCH_SUBMISSIONS
                    .with_label_values(&[err.kind()])
                    .inc();
                warn!(
                    "Rejecting submission while batch is {}",
                    batch.lifecycle.state_name()
                );
                return Err(err);
            }

            let eligible: Vec<BatchItem> = candidates
                .into_iter()
                .filter(|item| !item.is_saved())
                .collect();
            if eligible.is_empty() {
                let err = DashboardError::EmptyBatch;
                metrics::BATCH_SUBMISSIONS
                    .with_label_values(&[err.kind()])
                    .inc();
                info!("Nothing to download: every candidate is already saved");
                self.display
                    .show_notice(&err.user_message(), NoticeOptions::plain());
                return Err(err);
            }

            let batch_id = batch.lifecycle.begin()?;
            if let Err(e) = batch.tracker.initialize(eligible) {
                batch.reset();
                return Err(e.into());
            }
            batch.aggregator.reset();
            self.publish(batch.lifecycle);
            (batch_id, SubmissionRequest::from_items(batch.tracker.items()))
        };

        let total = request.len();
        info!("Submitting batch {} with {} facilities", batch_id, total);
        self.display.set_download_trigger(TriggerState::Busy);
        self.display.show_notice(
            &format!("Starting download of {} facilities...", total),
            NoticeOptions::activity(0),
        );

        let response = match self.submission.submit(&request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail_submission(batch_id, e.into()).await),
        };

        // Checked first: the busy answer may be nested in an otherwise successful body.
        if response.is_already_running() {
            let message = response
                .message()
                .unwrap_or(DEFAULT_BUSY_MESSAGE)
                .to_string();
            self.acknowledge(batch_id, Acceptance::RemoteBusy).await;
            metrics::BATCH_SUBMISSIONS
                .with_label_values(&["remote_busy"])
                .inc();
            warn!("Backend is already running a batch: {}", message);
            self.display.show_notice(&message, NoticeOptions::plain());
            return Ok(SubmitOutcome::RemoteBusy { batch_id, message });
        }

        if response.success {
            self.acknowledge(batch_id, Acceptance::Accepted).await;
            let counts = self.counts().await;
            metrics::BATCH_SUBMISSIONS
                .with_label_values(&["accepted"])
                .inc();
            metrics::BATCH_SIZE.observe(total as f64);
            info!("Batch {} accepted", batch_id);

            self.reconciler.refresh_current_state().await;
            return Ok(SubmitOutcome::Accepted { batch_id, counts });
        }

        let err = DashboardError::Server {
            status: None,
            message: response
                .message()
                .unwrap_or("the download request was rejected")
                .to_string(),
        };
        Err(self.fail_submission(batch_id, err).await)
    }

    /// Record the backend's answer if `batch_id` is still in flight.
    ///
    /// Progress is applied while the request is pending, so the batch may
    /// already have finalized by the time the answer arrives.
    async fn acknowledge(&self, batch_id: Uuid, answer: Acceptance) {
        let mut batch = self.batch.write().await;
        if batch.lifecycle.batch_id() != Some(batch_id) {
            debug!("Batch {} finished before the backend answered", batch_id);
            return;
        }
        match batch.lifecycle.acknowledge(answer) {
            Ok(()) => self.publish(batch.lifecycle),
            Err(e) => debug!("Not recording answer for batch {}: {}", batch_id, e),
        }
    }

    /// Reset after a submission-level failure and surface the cause.
    async fn fail_submission(&self, batch_id: Uuid, err: DashboardError) -> DashboardError {
        {
            let mut batch = self.batch.write().await;
            if batch.lifecycle.batch_id() == Some(batch_id) {
                batch.reset();
                self.publish(batch.lifecycle);
            }
        }
        metrics::BATCH_SUBMISSIONS
            .with_label_values(&[err.kind()])
            .inc();
        error!("Batch submission failed: {}", err);

        self.display.set_download_trigger(TriggerState::Idle);
        self.display
            .show_notice(&err.user_message(), NoticeOptions::plain());
        err
    }

    // =========================================================================
    // Progress
    // =========================================================================

    /// Apply one progress notice.
    ///
    /// Returns the final counts if this notice completed the batch.
    pub async fn apply_progress(&self, event: ProgressEvent) -> Option<BatchCounts> {
        let (changes, counts, finished) = {
            let mut guard = self.batch.write().await;
            let batch = &mut *guard;
            if !batch.lifecycle.is_in_flight() {
                debug!(
                    "Ignoring progress while batch is {}",
                    batch.lifecycle.state_name()
                );
                return None;
            }

            let mut changes: Vec<StatusChange> = Vec::new();
            if let Some(item) = &event.last_started {
                changes.extend(batch.tracker.mark_downloading(&item.identifier));
            }
            if let Some(item) = &event.last_completed {
                changes.extend(
                    batch
                        .tracker
                        .transition(&item.identifier, ItemOutcome::Completed),
                );
            }
            if let Some(item) = &event.last_failed {
                changes.extend(batch.tracker.transition(&item.identifier, ItemOutcome::Failed));
            }

            let finished = batch.aggregator.observe(&batch.tracker);
            if finished.is_some() {
                match batch.lifecycle.begin_finalizing() {
                    Ok(_) => self.publish(batch.lifecycle),
                    Err(e) => warn!("Could not enter finalization: {}", e),
                }
            }
            (changes, batch.counts(), finished)
        };

        for change in &changes {
            self.display
                .set_row_status(&change.identifier, change.current);
            if change.current.is_terminal() {
                metrics::BATCH_ITEMS
                    .with_label_values(&[change.current.as_str()])
                    .inc();
            }
        }

        match finished {
            Some(final_counts) => {
                self.finalize(final_counts).await;
                Some(final_counts)
            }
            None => {
                if !changes.is_empty() {
                    let current = (counts.finished() + 1).min(counts.total);
                    self.display.show_notice(
                        &format!("Downloading {} of {}", current, counts.total),
                        NoticeOptions::activity(counts.percentage()),
                    );
                }
                None
            }
        }
    }

    /// Dispatch one feed message.
    pub async fn apply_feed(&self, message: FeedMessage) -> Option<BatchCounts> {
        match message {
            FeedMessage::Progress(event) => self.apply_progress(event).await,
            FeedMessage::BackendIdle => {
                self.handle_backend_idle().await;
                None
            }
        }
    }

    /// Consume feed messages until the batch leaves flight.
    ///
    /// Returns the final counts if the batch completed. A reset while
    /// waiting (submission failure, backend idle) ends the drive.
    pub async fn drive(&self, feed: &mut mpsc::Receiver<FeedMessage>) -> Option<BatchCounts> {
        let mut lifecycle = self.subscribe_lifecycle();
        loop {
            if !lifecycle.borrow_and_update().is_busy() {
                return None;
            }
            tokio::select! {
                message = feed.recv() => {
                    let Some(message) = message else {
                        warn!("Progress feed closed while a batch is in flight");
                        return None;
                    };
                    if let Some(counts) = self.apply_feed(message).await {
                        return Some(counts);
                    }
                }
                changed = lifecycle.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    async fn handle_backend_idle(&self) {
        {
            let mut batch = self.batch.write().await;
            match batch.lifecycle {
                BatchLifecycle::InFlight {
                    acceptance: Acceptance::RemoteBusy,
                    batch_id,
                    ..
                } => {
                    info!(
                        "Backend is idle again, releasing batch {} that was never accepted",
                        batch_id
                    );
                    batch.reset();
                    self.publish(batch.lifecycle);
                }
                BatchLifecycle::InFlight { acceptance, .. } => {
                    let remaining = batch.counts().remaining;
                    debug!(
                        "Backend reported idle with {} items outstanding ({:?})",
                        remaining, acceptance
                    );
                    return;
                }
                _ => return,
            }
        }

        self.display.hide_notice();
        self.display.set_download_trigger(TriggerState::Idle);
        self.reconciler.refresh_current_state().await;
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    async fn finalize(&self, counts: BatchCounts) {
        metrics::BATCHES_FINALIZED.inc();
        info!(
            "Batch complete: {} successful, {} failed",
            counts.completed, counts.failed
        );

        self.display.show_notice(
            &format!(
                "Download complete: {} successful, {} failed",
                counts.completed, counts.failed
            ),
            NoticeOptions {
                show_activity: false,
                percentage: Some(100),
            },
        );
        tokio::time::sleep(self.config.completion_notice()).await;
        self.display.hide_notice();
        self.display.set_download_trigger(TriggerState::Idle);

        self.reconciler.refresh_current_state().await;

        let mut batch = self.batch.write().await;
        match batch.lifecycle.finish() {
            Ok(()) => self.publish(batch.lifecycle),
            Err(e) => warn!("Unexpected lifecycle state after finalization: {}", e),
        }
    }
}
