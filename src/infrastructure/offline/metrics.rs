use crate::domain::entities::offline::{SyncErrorKind, SyncResult};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// How a drain pass ended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    Completed,
    Halted(SyncErrorKind),
    /// Another pass was already running.
    Skipped,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetricsSnapshot {
    pub total_passes: u64,
    pub completed_passes: u64,
    pub halted_network: u64,
    pub halted_auth: u64,
    pub skipped_passes: u64,
    pub operations_synced: u64,
    pub operations_failed: u64,
    pub last_outcome: Option<PassOutcome>,
    pub last_trigger: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub last_timestamp_ms: Option<u64>,
}

#[derive(Default, Clone)]
struct LastPass {
    outcome: Option<PassOutcome>,
    trigger: Option<String>,
    duration_ms: Option<u64>,
    timestamp_ms: Option<u64>,
}

struct SyncMetrics {
    total: AtomicU64,
    completed: AtomicU64,
    halted_network: AtomicU64,
    halted_auth: AtomicU64,
    skipped: AtomicU64,
    synced: AtomicU64,
    failed: AtomicU64,
    last: Mutex<LastPass>,
}

impl SyncMetrics {
    fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            halted_network: AtomicU64::new(0),
            halted_auth: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            synced: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            last: Mutex::new(LastPass::default()),
        }
    }

    fn record(&self, outcome: PassOutcome, result: SyncResult, trigger: &str, duration_ms: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            PassOutcome::Completed => &self.completed,
            PassOutcome::Halted(SyncErrorKind::Network) => &self.halted_network,
            PassOutcome::Halted(SyncErrorKind::Auth) => &self.halted_auth,
            PassOutcome::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(result.synced), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(result.failed), Ordering::Relaxed);

        if let Ok(mut guard) = self.last.lock() {
            guard.outcome = Some(outcome);
            guard.trigger = Some(trigger.to_string());
            guard.duration_ms = Some(duration_ms);
            guard.timestamp_ms = Some(current_unix_ms());
        }
    }

    fn snapshot(&self) -> SyncMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        SyncMetricsSnapshot {
            total_passes: self.total.load(Ordering::Relaxed),
            completed_passes: self.completed.load(Ordering::Relaxed),
            halted_network: self.halted_network.load(Ordering::Relaxed),
            halted_auth: self.halted_auth.load(Ordering::Relaxed),
            skipped_passes: self.skipped.load(Ordering::Relaxed),
            operations_synced: self.synced.load(Ordering::Relaxed),
            operations_failed: self.failed.load(Ordering::Relaxed),
            last_outcome: last.outcome,
            last_trigger: last.trigger,
            last_duration_ms: last.duration_ms,
            last_timestamp_ms: last.timestamp_ms,
        }
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

static SYNC_METRICS: LazyLock<SyncMetrics> = LazyLock::new(SyncMetrics::new);

pub fn record_pass(
    outcome: PassOutcome,
    result: SyncResult,
    trigger: &str,
    duration_ms: u64,
) -> SyncMetricsSnapshot {
    SYNC_METRICS.record(outcome, result, trigger, duration_ms);
    SYNC_METRICS.snapshot()
}

pub fn snapshot() -> SyncMetricsSnapshot {
    SYNC_METRICS.snapshot()
}
