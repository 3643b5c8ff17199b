//! Background poller that turns backend snapshots into progress events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::backend::{ProgressSnapshot, ProgressSource};
use crate::batch::DownloadStatus;

use super::{FeedMessage, ItemRef, ProgressEvent};

/// Diffs consecutive snapshots so each status change is emitted once.
///
/// The first snapshot only records a baseline: whatever it lists belongs to
/// a run that started before this diff was watching, even while the backend
/// still reports it as active.
#[derive(Debug, Default)]
pub struct SnapshotDiff {
    statuses: HashMap<String, DownloadStatus>,
    last_active: Option<bool>,
    last_run: Option<String>,
}

impl SnapshotDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed messages for everything that changed since the previous snapshot,
    /// in the order the backend lists facilities.
    pub fn apply(&mut self, snapshot: &ProgressSnapshot) -> Vec<FeedMessage> {
        let mut messages = Vec::new();
        let baseline = self.last_active.is_none();
        let run = snapshot.run_key();

        if !baseline && self.is_new_run(snapshot) {
            debug!("Backend started a new run ({})", run.unwrap_or("unnamed"));
            self.statuses.clear();
        }
        if let Some(run) = run {
            self.last_run = Some(run.to_string());
        }

        for facility in &snapshot.facilities {
            match facility.download_status() {
                Some(status) => {
                    if let Some(event) = self.record(&facility.inspection_id, status) {
                        if !baseline {
                            messages.push(FeedMessage::Progress(event));
                        }
                    }
                }
                None => debug!(
                    "Ignoring unknown status '{}' for {}",
                    facility.status, facility.inspection_id
                ),
            }
        }

        let refs: [(&Option<ItemRef>, DownloadStatus); 3] = [
            (&snapshot.last_started, DownloadStatus::Downloading),
            (&snapshot.last_completed, DownloadStatus::Completed),
            (&snapshot.last_failed, DownloadStatus::Failed),
        ];
        for (item, status) in refs {
            if let Some(item) = item {
                if let Some(event) = self.record(&item.identifier, status) {
                    if !baseline {
                        messages.push(FeedMessage::Progress(event));
                    }
                }
            }
        }

        if !snapshot.is_active && self.last_active != Some(false) {
            messages.push(FeedMessage::BackendIdle);
        }
        self.last_active = Some(snapshot.is_active);

        messages
    }

    /// An idle to active edge, or a run key different from the last one seen.
    fn is_new_run(&self, snapshot: &ProgressSnapshot) -> bool {
        if snapshot.is_active && self.last_active == Some(false) {
            return true;
        }
        match (snapshot.run_key(), self.last_run.as_deref()) {
            (Some(run), Some(last)) => run != last,
            (Some(_), None) => snapshot.is_active,
            _ => false,
        }
    }

    fn record(&mut self, identifier: &str, status: DownloadStatus) -> Option<ProgressEvent> {
        if self.statuses.get(identifier) == Some(&status) {
            return None;
        }
        self.statuses.insert(identifier.to_string(), status);

        match status {
            DownloadStatus::Pending => None,
            DownloadStatus::Downloading => Some(ProgressEvent::started(identifier)),
            DownloadStatus::Completed => Some(ProgressEvent::completed(identifier)),
            DownloadStatus::Failed => Some(ProgressEvent::failed(identifier)),
        }
    }
}

/// Polls a [`ProgressSource`] on an interval and forwards feed messages.
pub struct ProgressPoller {
    source: Arc<dyn ProgressSource>,
    interval: Duration,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    primed_tx: Arc<watch::Sender<bool>>,
}

impl ProgressPoller {
    pub fn new(source: Arc<dyn ProgressSource>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (primed_tx, _) = watch::channel(false);
        Self {
            source,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            primed_tx: Arc::new(primed_tx),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Flips to `true` once the first poll has finished, successful or not.
    ///
    /// Submitting after this keeps the baseline snapshot ahead of the batch.
    pub fn primed(&self) -> watch::Receiver<bool> {
        self.primed_tx.subscribe()
    }

    /// Spawn the poll loop. Returns `None` if it is already running.
    pub fn start(&self, tx: mpsc::Sender<FeedMessage>) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Progress poller already running");
            return None;
        }

        let source = Arc::clone(&self.source);
        let running = Arc::clone(&self.running);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let primed_tx = Arc::clone(&self.primed_tx);
        primed_tx.send_replace(false);

        Some(tokio::spawn(async move {
            info!("Progress poller started");
            let mut diff = SnapshotDiff::new();
            // First tick fires immediately so the baseline predates the batch.
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            'poll: loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Progress poller received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        let fetched = source.fetch_progress().await;
                        primed_tx.send_replace(true);
                        let snapshot = match fetched {
                            Ok(snapshot) => snapshot,
                            Err(e) => {
                                warn!("Failed to fetch progress: {}", e);
                                continue;
                            }
                        };
                        for message in diff.apply(&snapshot) {
                            if tx.send(message).await.is_err() {
                                debug!("Progress receiver dropped");
                                break 'poll;
                            }
                        }
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
            // Waiters must not hang on a poller that never polled.
            primed_tx.send_replace(true);
            info!("Progress poller stopped");
        }))
    }

    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Progress poller not running");
            return;
        }
        let _ = self.shutdown_tx.send(());
    }
}
