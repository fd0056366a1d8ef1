use super::connection_monitor::ConnectionMonitor;
use super::operation_queue::OperationQueue;
use super::sync_service::SyncEngine;
use crate::domain::entities::offline::QueueCounts;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Background loop: drains the queue when connectivity comes back and keeps the
/// published queue counters fresh.
pub struct SyncWorker {
    engine: Arc<SyncEngine>,
    queue: Arc<OperationQueue>,
    monitor: Arc<ConnectionMonitor>,
    counts: watch::Sender<QueueCounts>,
    refresh_interval: Duration,
    auto_sync: bool,
    running: AtomicBool,
}

pub struct WorkerHandle {
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SyncWorker {
    pub fn new(
        engine: Arc<SyncEngine>,
        queue: Arc<OperationQueue>,
        monitor: Arc<ConnectionMonitor>,
        refresh_interval: Duration,
        auto_sync: bool,
    ) -> Self {
        let (counts, _) = watch::channel(QueueCounts::default());
        Self {
            engine,
            queue,
            monitor,
            counts,
            refresh_interval,
            auto_sync,
            running: AtomicBool::new(false),
        }
    }

    /// Queue counters for the pending indicator; refreshed on an interval and after
    /// every automatic pass.
    pub fn subscribe_counts(&self) -> watch::Receiver<QueueCounts> {
        self.counts.subscribe()
    }

    /// Returns `None` if the worker is already running.
    pub fn start(self: &Arc<Self>) -> Option<WorkerHandle> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!(target: "offline::sync", "sync worker already running");
            return None;
        }

        let worker = Arc::clone(self);
        let handle = tokio::spawn(async move {
            worker.run().await;
            worker.running.store(false, Ordering::SeqCst);
        });
        Some(WorkerHandle {
            handle: Some(handle),
        })
    }

    async fn run(&self) {
        let mut state = self.monitor.subscribe();
        let mut was_offline = state.borrow_and_update().is_offline;
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let is_offline = state.borrow_and_update().is_offline;
                    let reconnected = was_offline && !is_offline;
                    was_offline = is_offline;
                    if reconnected && self.auto_sync {
                        self.sync_after_reconnect().await;
                    }
                }
                _ = ticker.tick() => {
                    self.refresh_counts().await;
                }
            }
        }
    }

    async fn sync_after_reconnect(&self) {
        tracing::info!(target: "offline::sync", "connectivity restored; draining queue");
        if let Err(err) = self.engine.sync_now("reconnect").await {
            tracing::error!(target: "offline::sync", error = %err, "automatic sync failed");
        }
        self.refresh_counts().await;
    }

    pub async fn refresh_counts(&self) {
        match self.queue.counts().await {
            Ok(counts) => {
                self.counts.send_if_modified(|current| {
                    if *current == counts {
                        return false;
                    }
                    *current = counts;
                    true
                });
            }
            Err(err) => {
                tracing::warn!(target: "offline::sync", error = %err, "failed to refresh queue counts");
            }
        }
    }
}
