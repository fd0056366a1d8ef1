use super::{QueueCounts, SyncResult};
use serde::{Deserialize, Serialize};

/// Why the last drain pass stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    Auth,
    Network,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub is_offline: bool,
    pub last_sync_error: Option<SyncErrorKind>,
    pub is_syncing: bool,
    pub last_sync_result: Option<SyncResult>,
}

/// What the persistent status badge should tell the attendant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncIndicator {
    UpToDate,
    Syncing,
    /// Pending work that will go out on its own once connectivity returns.
    WillRetry { pending: u64 },
    /// Credentials are missing or were rejected.
    NeedsLogin { pending: u64 },
    /// The remote rejected one or more operations.
    NeedsAttention { errored: u64, pending: u64 },
}

impl SyncIndicator {
    pub fn derive(state: &ConnectionState, counts: &QueueCounts) -> Self {
        if state.is_syncing {
            return SyncIndicator::Syncing;
        }
        if counts.errored > 0 {
            return SyncIndicator::NeedsAttention {
                errored: counts.errored,
                pending: counts.pending,
            };
        }
        if counts.pending == 0 {
            return SyncIndicator::UpToDate;
        }
        match state.last_sync_error {
            Some(SyncErrorKind::Auth) => SyncIndicator::NeedsLogin {
                pending: counts.pending,
            },
            _ => SyncIndicator::WillRetry {
                pending: counts.pending,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pending: u64, errored: u64) -> QueueCounts {
        QueueCounts {
            pending,
            synced: 0,
            errored,
        }
    }

    #[test]
    fn errored_operations_take_precedence() {
        let state = ConnectionState {
            is_offline: true,
            last_sync_error: Some(SyncErrorKind::Auth),
            ..ConnectionState::default()
        };
        assert_eq!(
            SyncIndicator::derive(&state, &counts(3, 1)),
            SyncIndicator::NeedsAttention {
                errored: 1,
                pending: 3
            }
        );
    }

    #[test]
    fn auth_error_asks_for_login() {
        let state = ConnectionState {
            last_sync_error: Some(SyncErrorKind::Auth),
            ..ConnectionState::default()
        };
        assert_eq!(
            SyncIndicator::derive(&state, &counts(2, 0)),
            SyncIndicator::NeedsLogin { pending: 2 }
        );
    }

    #[test]
    fn offline_pending_will_retry() {
        let state = ConnectionState {
            is_offline: true,
            ..ConnectionState::default()
        };
        assert_eq!(
            SyncIndicator::derive(&state, &counts(4, 0)),
            SyncIndicator::WillRetry { pending: 4 }
        );
        assert_eq!(
            SyncIndicator::derive(&ConnectionState::default(), &counts(0, 0)),
            SyncIndicator::UpToDate
        );
    }
}
