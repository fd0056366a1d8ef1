use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Upper bound for a single live or replayed request, in milliseconds.
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    /// How often the pending/errored counters are refreshed for display.
    pub pending_refresh_secs: u64,
    pub synced_retention_days: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub tariff_max_age_secs: u64,
    pub space_max_age_secs: u64,
    pub vehicle_max_age_secs: u64,
    pub transaction_max_age_secs: u64,
    pub profile_refetch_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub device_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                base_url: "http://localhost:8080/api".to_string(),
                request_timeout_ms: 10_000,
            },
            sync: SyncConfig {
                auto_sync: true,
                pending_refresh_secs: 5,
                synced_retention_days: 30,
            },
            cache: CacheConfig {
                tariff_max_age_secs: 6 * 3600,
                space_max_age_secs: 5 * 60,
                vehicle_max_age_secs: 5 * 60,
                transaction_max_age_secs: 15 * 60,
                profile_refetch_secs: 30,
            },
            device: DeviceConfig {
                device_id: "pos-01".to_string(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PARKPOS_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Some(value) = env_u64("PARKPOS_DATABASE_MAX_CONNECTIONS") {
            cfg.database.max_connections = value.clamp(1, u64::from(u32::MAX)) as u32;
        }
        if let Ok(v) = std::env::var("PARKPOS_API_BASE_URL") {
            if !v.trim().is_empty() {
                cfg.remote.base_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(value) = env_u64("PARKPOS_REQUEST_TIMEOUT_MS") {
            cfg.remote.request_timeout_ms = value.max(100);
        }
        if let Ok(v) = std::env::var("PARKPOS_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_u64("PARKPOS_PENDING_REFRESH_SECS") {
            cfg.sync.pending_refresh_secs = value.max(1);
        }
        if let Some(value) = env_u64("PARKPOS_SYNCED_RETENTION_DAYS") {
            cfg.sync.synced_retention_days = value;
        }
        if let Some(value) = env_u64("PARKPOS_TARIFF_MAX_AGE_SECS") {
            cfg.cache.tariff_max_age_secs = value;
        }
        if let Some(value) = env_u64("PARKPOS_SPACE_MAX_AGE_SECS") {
            cfg.cache.space_max_age_secs = value;
        }
        if let Some(value) = env_u64("PARKPOS_VEHICLE_MAX_AGE_SECS") {
            cfg.cache.vehicle_max_age_secs = value;
        }
        if let Some(value) = env_u64("PARKPOS_TRANSACTION_MAX_AGE_SECS") {
            cfg.cache.transaction_max_age_secs = value;
        }
        if let Ok(v) = std::env::var("PARKPOS_DEVICE_ID") {
            if !v.trim().is_empty() {
                cfg.device.device_id = v.trim().to_string();
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.remote.base_url.trim().is_empty() {
            return Err("Remote base_url must not be empty".to_string());
        }
        if self.remote.request_timeout_ms == 0 {
            return Err("Remote request_timeout_ms must be greater than 0".to_string());
        }
        if self.sync.pending_refresh_secs == 0 {
            return Err("Sync pending_refresh_secs must be greater than 0".to_string());
        }
        if self.device.device_id.trim().is_empty() {
            return Err("Device id must not be empty".to_string());
        }
        if self.device.device_id.contains(char::is_whitespace) {
            return Err("Device id must not contain whitespace".to_string());
        }
        Ok(())
    }
}

impl SyncConfig {
    pub fn synced_retention(&self) -> chrono::Duration {
        let days = i64::try_from(self.synced_retention_days).unwrap_or(i64::MAX);
        chrono::Duration::days(days.min(MAX_DAYS))
    }
}

impl CacheConfig {
    pub fn profile_refetch_interval(&self) -> chrono::Duration {
        seconds(self.profile_refetch_secs)
    }
}

// chrono::Duration is bounded to i64::MAX milliseconds.
const MAX_SECONDS: i64 = i64::MAX / 1_000;
const MAX_DAYS: i64 = MAX_SECONDS / 86_400;

pub(crate) fn seconds(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX).min(MAX_SECONDS))
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .map(|dir| dir.join("parkpos"))
        .unwrap_or_else(|| PathBuf::from("./data"));
    format!("sqlite://{}?mode=rwc", dir.join("parkpos.db").display())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| parse_u64(&v))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}
