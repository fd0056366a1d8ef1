use super::connection_monitor::ConnectionMonitor;
use super::offline_cache::SessionCache;
use crate::application::ports::{ProfileApi, RemoteError, TokenProvider};
use crate::domain::entities::session::UserProfile;
use crate::shared::clock::Clock;
use crate::shared::error::AppError;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

struct FetchedProfile {
    profile: UserProfile,
    fetched_at: DateTime<Utc>,
}

/// Resolves the current operator: live profile when reachable, offline session otherwise.
pub struct SessionService {
    profiles: Arc<dyn ProfileApi>,
    tokens: Arc<dyn TokenProvider>,
    sessions: Arc<SessionCache>,
    monitor: Arc<ConnectionMonitor>,
    clock: Arc<dyn Clock>,
    refetch_interval: Duration,
    // Held for the whole fetch so concurrent callers share one request.
    last_fetch: Mutex<Option<FetchedProfile>>,
}

impl SessionService {
    pub fn new(
        profiles: Arc<dyn ProfileApi>,
        tokens: Arc<dyn TokenProvider>,
        sessions: Arc<SessionCache>,
        monitor: Arc<ConnectionMonitor>,
        clock: Arc<dyn Clock>,
        refetch_interval: Duration,
    ) -> Self {
        Self {
            profiles,
            tokens,
            sessions,
            monitor,
            clock,
            refetch_interval,
            last_fetch: Mutex::new(None),
        }
    }

    pub async fn current_profile(&self) -> Result<Option<UserProfile>, AppError> {
        if self.monitor.is_offline() {
            return self.offline_profile().await;
        }

        let mut last_fetch = self.last_fetch.lock().await;
        let now = self.clock.now();
        if let Some(fetched) = last_fetch.as_ref() {
            if now - fetched.fetched_at < self.refetch_interval {
                return Ok(Some(fetched.profile.clone()));
            }
        }

        let Some(token) = self.tokens.get_token().await? else {
            *last_fetch = None;
            return Ok(None);
        };

        match self.profiles.fetch_profile(&token).await {
            Ok(profile) => {
                self.monitor.record_request_success();
                self.sessions.save_offline_session(&profile).await?;
                *last_fetch = Some(FetchedProfile {
                    profile: profile.clone(),
                    fetched_at: now,
                });
                Ok(Some(profile))
            }
            Err(err) if err.is_transient() => {
                if matches!(err, RemoteError::Network(_)) {
                    self.monitor.record_network_failure();
                }
                tracing::warn!(target: "offline::cache", error = %err, "profile fetch failed; using offline session");
                drop(last_fetch);
                self.offline_profile().await
            }
            Err(RemoteError::Auth(message)) => {
                *last_fetch = None;
                Err(AppError::Auth(message))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Forgets both the cached live profile and the offline session.
    pub async fn logout(&self) -> Result<(), AppError> {
        *self.last_fetch.lock().await = None;
        self.sessions.clear_offline_session().await
    }

    async fn offline_profile(&self) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .sessions
            .get_offline_session()
            .await?
            .map(|snapshot| snapshot.to_profile()))
    }
}
