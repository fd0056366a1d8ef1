use crate::application::ports::ConnectivityEvent;
use crate::domain::entities::offline::{ConnectionState, SyncErrorKind, SyncResult};
use crate::shared::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Best-effort online/offline flag plus the shared sync status.
///
/// Connectivity detection is heuristic: the platform signal is authoritative for going
/// offline, while any successful response proves the remote is reachable.
pub struct ConnectionMonitor {
    state: watch::Sender<ConnectionState>,
    platform_online: AtomicBool,
    initialized: AtomicBool,
}

/// Keeps the platform listener alive; dropping it stops observation.
pub struct MonitorGuard {
    handle: Option<JoinHandle<()>>,
}

impl MonitorGuard {
    pub fn teardown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(target: "offline::monitor", "connectivity listener stopped");
        }
    }
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ConnectionMonitor {
    pub fn new(platform_online: bool) -> Self {
        let (state, _) = watch::channel(ConnectionState {
            is_offline: !platform_online,
            ..ConnectionState::default()
        });
        Self {
            state,
            platform_online: AtomicBool::new(platform_online),
            initialized: AtomicBool::new(false),
        }
    }

    /// Starts following platform connectivity events. Only one listener per monitor.
    pub fn initialize(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<ConnectivityEvent>,
    ) -> Result<MonitorGuard, AppError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(AppError::Internal(
                "Connection monitor is already initialized".to_string(),
            ));
        }

        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                monitor.handle_platform_event(event);
            }
            tracing::debug!(target: "offline::monitor", "connectivity event source closed");
        });

        tracing::info!(
            target: "offline::monitor",
            is_offline = self.is_offline(),
            "connection monitor initialized"
        );
        Ok(MonitorGuard {
            handle: Some(handle),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_offline(&self) -> bool {
        self.state.borrow().is_offline
    }

    pub fn handle_platform_event(&self, event: ConnectivityEvent) {
        let online = event == ConnectivityEvent::Online;
        self.platform_online.store(online, Ordering::SeqCst);
        self.set_offline(!online, "platform");
    }

    pub fn record_request_success(&self) {
        self.set_offline(false, "request_succeeded");
    }

    /// A transport failure only counts as evidence while the platform agrees.
    pub fn record_network_failure(&self) {
        if !self.platform_online.load(Ordering::SeqCst) {
            self.set_offline(true, "request_failed");
        }
    }

    fn set_offline(&self, offline: bool, reason: &'static str) {
        let changed = self.state.send_if_modified(|state| {
            if state.is_offline == offline {
                return false;
            }
            state.is_offline = offline;
            true
        });
        if changed {
            tracing::info!(target: "offline::monitor", is_offline = offline, reason, "connection state changed");
        }
    }

    /// Atomically claims the single sync slot. `false` means a pass is already running.
    pub fn try_begin_sync(&self) -> bool {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if state.is_syncing {
                return false;
            }
            state.is_syncing = true;
            claimed = true;
            true
        });
        claimed
    }

    /// Releases the sync slot. `result` is left untouched when `None`.
    pub fn finish_sync(&self, result: Option<SyncResult>, error: Option<SyncErrorKind>) {
        self.state.send_modify(|state| {
            state.is_syncing = false;
            state.last_sync_error = error;
            if let Some(result) = result {
                state.last_sync_result = Some(result);
            }
        });
    }

    /// Releases the sync slot after a local failure, keeping the previous outcome.
    pub fn abandon_sync(&self) {
        self.state.send_if_modified(|state| {
            let was_syncing = state.is_syncing;
            state.is_syncing = false;
            was_syncing
        });
    }
}
