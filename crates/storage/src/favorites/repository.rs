use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use bistro_core::errors::{Error, Result};
use bistro_core::favorites::FavoriteRepositoryTrait;
use bistro_core::restaurants::RestaurantSummary;

use super::model::NewFavoriteDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::restaurants::summary::{load_summaries, SummaryFilter, SummaryOrder};
use crate::schema::{favorites, restaurants};

pub struct FavoriteRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl FavoriteRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        FavoriteRepository { pool, writer }
    }
}

#[async_trait]
impl FavoriteRepositoryTrait for FavoriteRepository {
    async fn add(&self, client_id: i32, restaurant_id: i32) -> Result<bool> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let restaurant_exists = restaurants::table
                    .find(restaurant_id)
                    .select(restaurants::id)
                    .first::<i32>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .is_some();
                if !restaurant_exists {
                    return Err(Error::not_found(format!(
                        "Restaurant {} not found",
                        restaurant_id
                    )));
                }

                let inserted = diesel::insert_into(favorites::table)
                    .values(NewFavoriteDB {
                        client_id,
                        restaurant_id,
                        created_at: Utc::now().to_rfc3339(),
                    })
                    .on_conflict((favorites::client_id, favorites::restaurant_id))
                    .do_nothing()
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(inserted > 0)
            })
            .await
    }

    async fn remove(&self, client_id: i32, restaurant_id: i32) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let removed = diesel::delete(
                    favorites::table
                        .filter(favorites::client_id.eq(client_id))
                        .filter(favorites::restaurant_id.eq(restaurant_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                if removed == 0 {
                    return Err(Error::not_found(format!(
                        "Favorite {}/{} not found",
                        client_id, restaurant_id
                    )));
                }
                Ok(())
            })
            .await
    }

    fn list_ids(&self, client_id: i32) -> Result<Vec<i32>> {
        let mut conn = get_connection(&self.pool)?;
        let ids = favorites::table
            .filter(favorites::client_id.eq(client_id))
            .order(favorites::id.asc())
            .select(favorites::restaurant_id)
            .load::<i32>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(ids)
    }

    fn list_restaurants(&self, client_id: i32) -> Result<Vec<RestaurantSummary>> {
        let mut conn = get_connection(&self.pool)?;
        load_summaries(
            &mut conn,
            SummaryFilter::FavoritesOf(client_id),
            SummaryOrder::Id,
            None,
        )
    }
}
