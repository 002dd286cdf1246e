use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diesel::pg::PgConnection;

use bistro_core::errors::{Error, Result};
use bistro_core::sync::{RemoteSession, RemoteSyncStore, SyncRow, SyncTable};

use super::pool::{PgPooledConnection, RemotePool};
use super::upsert::upsert_row;
use crate::errors::StorageError;
use crate::sync::load_sync_rows;

/// Remote side of replication, backed by the bounded PostgreSQL pool.
pub struct PgSyncStore {
    pool: RemotePool,
}

impl PgSyncStore {
    pub fn new(pool: RemotePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &RemotePool {
        &self.pool
    }
}

#[async_trait]
impl RemoteSyncStore for PgSyncStore {
    async fn acquire(&self) -> Result<Box<dyn RemoteSession>> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgSession::new(conn)))
    }

    fn active_connections(&self) -> u32 {
        self.pool.active_connections()
    }
}

/// One checked-out connection. Dropping the session returns it to the pool.
///
/// Diesel is blocking, so every statement runs on the blocking thread pool.
/// A statement still in flight when the session is dropped keeps the
/// connection until it finishes.
pub struct PgSession {
    conn: Arc<Mutex<PgPooledConnection>>,
}

impl PgSession {
    fn new(conn: PgPooledConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| Error::internal("Remote connection lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))?
    }
}

#[async_trait]
impl RemoteSession for PgSession {
    async fn read_all(&self, table: SyncTable) -> Result<Vec<SyncRow>> {
        self.with_conn(move |conn| {
            let rows = load_sync_rows!(conn, table).map_err(StorageError::from)?;
            Ok(rows)
        })
        .await
    }

    async fn upsert(&self, row: &SyncRow) -> Result<()> {
        let row = row.clone();
        self.with_conn(move |conn| {
            upsert_row(conn, row).map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }
}
