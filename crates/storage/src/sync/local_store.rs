use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use bistro_core::errors::Result;
use bistro_core::sync::{LocalSyncStore, SyncRow, SyncTable};

use super::load_sync_rows;
use crate::clients::ClientDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::favorites::FavoriteDB;
use crate::reports::ReportDB;
use crate::restaurants::RestaurantDB;
use crate::reviews::ReviewDB;
use crate::schema::{clients, favorites, reports, restaurants, reviews};

/// Local side of replication. Writes go through the single writer so imports
/// never race application traffic for the SQLite lock.
pub struct SqliteSyncStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteSyncStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl LocalSyncStore for SqliteSyncStore {
    async fn read_all(&self, table: SyncTable) -> Result<Vec<SyncRow>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = load_sync_rows!(&mut conn, table).map_err(StorageError::from)?;
        Ok(rows)
    }

    async fn clear_table(&self, table: SyncTable) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let removed = match table {
                    SyncTable::Restaurants => diesel::delete(restaurants::table).execute(conn),
                    SyncTable::Clients => diesel::delete(clients::table).execute(conn),
                    SyncTable::Favorites => diesel::delete(favorites::table).execute(conn),
                    SyncTable::Reviews => diesel::delete(reviews::table).execute(conn),
                    SyncTable::Reports => diesel::delete(reports::table).execute(conn),
                }
                .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }

    async fn insert_row(&self, row: SyncRow) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                match row {
                    SyncRow::Restaurant(r) => diesel::insert_into(restaurants::table)
                        .values(RestaurantDB::from(r))
                        .execute(conn),
                    SyncRow::Client(c) => diesel::insert_into(clients::table)
                        .values(ClientDB::from(c))
                        .execute(conn),
                    SyncRow::Favorite(f) => diesel::insert_into(favorites::table)
                        .values(FavoriteDB::from(f))
                        .execute(conn),
                    SyncRow::Review(r) => diesel::insert_into(reviews::table)
                        .values(ReviewDB::from(r))
                        .execute(conn),
                    SyncRow::Report(r) => diesel::insert_into(reports::table)
                        .values(ReportDB::from(r))
                        .execute(conn),
                }
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
