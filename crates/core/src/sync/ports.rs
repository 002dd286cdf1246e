use async_trait::async_trait;

use super::{SyncRow, SyncTable};
use crate::errors::Result;

/// The embedded store serving application traffic.
#[async_trait]
pub trait LocalSyncStore: Send + Sync {
    async fn read_all(&self, table: SyncTable) -> Result<Vec<SyncRow>>;

    /// Deletes every row of `table`. Returns the number of rows removed.
    async fn clear_table(&self, table: SyncTable) -> Result<usize>;

    /// Inserts a row as-is, keeping its id.
    async fn insert_row(&self, row: SyncRow) -> Result<()>;
}

/// The durable system of record.
#[async_trait]
pub trait RemoteSyncStore: Send + Sync {
    /// Checks a connection out of the pool. The connection goes back when the
    /// session is dropped.
    async fn acquire(&self) -> Result<Box<dyn RemoteSession>>;

    /// Connections currently checked out.
    fn active_connections(&self) -> u32;
}

/// A held remote connection.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn read_all(&self, table: SyncTable) -> Result<Vec<SyncRow>>;

    /// Inserts the row, or updates every non-key column when the table's
    /// natural key already exists.
    async fn upsert(&self, row: &SyncRow) -> Result<()>;
}
