use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use bistro_core::errors::Result;
use bistro_core::reviews::{NewReview, Review, ReviewRepositoryTrait, DEFAULT_REVIEW_LIMIT};

use super::model::{NewReviewDB, ReviewDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::reviews;

pub struct ReviewRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReviewRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ReviewRepository { pool, writer }
    }
}

#[async_trait]
impl ReviewRepositoryTrait for ReviewRepository {
    async fn submit(&self, new_review: NewReview) -> Result<Review> {
        new_review.validate()?;
        let new_db = NewReviewDB {
            restaurant_id: new_review.restaurant_id,
            reviewer_name: new_review.reviewer_name.trim().to_string(),
            rating: new_review.rating,
            review_text: Some(new_review.review_text.unwrap_or_default()),
            created_at: Utc::now().to_rfc3339(),
        };

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Review> {
                let created = diesel::insert_into(reviews::table)
                    .values(&new_db)
                    .returning(ReviewDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Review::from(created))
            })
            .await
    }

    fn list(&self, restaurant_id: i32, limit: Option<i64>) -> Result<Vec<Review>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = reviews::table
            .filter(reviews::restaurant_id.eq(restaurant_id))
            .order((reviews::created_at.desc(), reviews::id.desc()))
            .limit(limit.unwrap_or(DEFAULT_REVIEW_LIMIT))
            .select(ReviewDB::as_select())
            .load::<ReviewDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Review::from).collect())
    }
}
