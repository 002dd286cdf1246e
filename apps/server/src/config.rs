//! Process configuration, read from the environment.

use std::time::Duration;

use bistro_core::errors::{Error, Result};
use bistro_core::sync::{SyncConfig, SyncSchedule};
use bistro_storage::RemoteConfig;

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: String,
    /// `None` runs the service on the local store only.
    pub remote: Option<RemoteConfig>,
    pub sync: SyncConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = var("BISTRO_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        let schedule = match var("BISTRO_SYNC_SCHEDULE") {
            Some(expression) => expression.parse::<SyncSchedule>()?,
            None => SyncSchedule::default(),
        };

        let remote = match var("PG_CONNECTION_STRING") {
            Some(url) => {
                let mut remote = RemoteConfig::new(url);
                if let Some(ssl_mode) = var("PG_SSL_MODE") {
                    remote.ssl_mode = ssl_mode;
                }
                remote.max_size = positive(&var, "PG_POOL_MAX_SIZE", remote.max_size)?;
                remote.idle_timeout = seconds(&var, "PG_POOL_IDLE_TIMEOUT_SECS", remote.idle_timeout)?;
                remote.connect_timeout =
                    seconds(&var, "PG_CONNECT_TIMEOUT_SECS", remote.connect_timeout)?;
                Some(remote)
            }
            None => None,
        };

        Ok(Self {
            data_dir,
            remote,
            sync: SyncConfig {
                schedule,
                ..SyncConfig::default()
            },
        })
    }
}

fn positive(var: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> Result<u32> {
    match var(key) {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                Error::Config(format!("{} must be a positive integer, got '{}'", key, raw))
            }),
        None => Ok(default),
    }
}

fn seconds(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    match var(key) {
        Some(_) => positive(var, key, 1).map(|secs| Duration::from_secs(u64::from(secs))),
        None => Ok(default),
    }
}
