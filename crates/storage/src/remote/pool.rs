//! Bounded connection pool for the remote store.
//!
//! Connections are opened lazily, reaped after sitting idle, and returned to
//! the pool when the holder is dropped. Errors raised by idle or background
//! connections are reported through [`PoolErrorListener`] instead of
//! escaping to callers.

use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use log::{debug, error, warn};
use r2d2::event::{AcquireEvent, ReleaseEvent, TimeoutEvent};
use r2d2::{HandleError, HandleEvent};

use bistro_core::errors::{Error, Result};

use crate::errors::StorageError;

pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    /// Applied when the URL carries no `sslmode` of its own.
    pub ssl_mode: String,
    pub max_size: u32,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
}

impl RemoteConfig {
    pub const DEFAULT_SSL_MODE: &'static str = "require";
    pub const DEFAULT_MAX_SIZE: u32 = 10;
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ssl_mode: Self::DEFAULT_SSL_MODE.to_string(),
            max_size: Self::DEFAULT_MAX_SIZE,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn connection_url(&self) -> String {
        with_ssl_mode(&self.url, &self.ssl_mode)
    }
}

/// Appends `sslmode` to a connection string that does not set one.
///
/// Handles both URL (`postgres://...`) and key/value (`host=... dbname=...`) forms.
pub fn with_ssl_mode(url: &str, ssl_mode: &str) -> String {
    let url = url.trim();
    if url.contains("sslmode=") || ssl_mode.is_empty() {
        return url.to_string();
    }
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}sslmode={}", url, separator, ssl_mode)
    } else {
        format!("{} sslmode={}", url, ssl_mode)
    }
}

/// Logs connection errors raised outside a caller's request.
#[derive(Debug, Clone, Copy)]
pub struct PoolErrorListener;

impl HandleError<diesel::r2d2::Error> for PoolErrorListener {
    fn handle_error(&self, error: diesel::r2d2::Error) {
        error!("[RemotePool] Connection error: {}", error);
    }
}

#[derive(Debug, Clone, Copy)]
struct PoolEventLogger;

impl HandleEvent for PoolEventLogger {
    fn handle_acquire(&self, event: AcquireEvent) {
        debug!("[RemotePool] Opened connection {}", event.connection_id());
    }

    fn handle_release(&self, event: ReleaseEvent) {
        debug!(
            "[RemotePool] Closed connection {} after {:?}",
            event.connection_id(),
            event.age()
        );
    }

    fn handle_timeout(&self, event: TimeoutEvent) {
        warn!(
            "[RemotePool] No connection available within {:?}",
            event.timeout()
        );
    }
}

/// Cheap to clone; clones share the same pool.
#[derive(Clone)]
pub struct RemotePool {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl RemotePool {
    /// Builds the pool without connecting. The first connection is opened on
    /// the first checkout, so an unreachable server does not block startup.
    pub fn new(config: &RemoteConfig) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(config.connection_url());
        let pool = Pool::builder()
            .max_size(config.max_size.max(1))
            .min_idle(Some(0))
            .idle_timeout(Some(config.idle_timeout))
            .connection_timeout(config.connect_timeout)
            .test_on_check_out(true)
            .error_handler(Box::new(PoolErrorListener))
            .event_handler(Box::new(PoolEventLogger))
            .build_unchecked(manager);
        Self { pool }
    }

    /// Blocking checkout. Waits at most the configured connect timeout.
    pub fn get(&self) -> std::result::Result<PgPooledConnection, StorageError> {
        Ok(self.pool.get()?)
    }

    /// Checkout from async code without blocking the runtime.
    pub async fn acquire(&self) -> Result<PgPooledConnection> {
        let pool = self.clone();
        let conn = tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|e| Error::Task(e.to_string()))??;
        Ok(conn)
    }

    /// Connections currently checked out.
    pub fn active_connections(&self) -> u32 {
        let state = self.pool.state();
        state.connections.saturating_sub(state.idle_connections)
    }

    pub fn max_size(&self) -> u32 {
        self.pool.max_size()
    }
}
