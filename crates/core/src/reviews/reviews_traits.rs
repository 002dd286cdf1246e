use async_trait::async_trait;

use super::{NewReview, Review};
use crate::errors::Result;

#[async_trait]
pub trait ReviewRepositoryTrait: Send + Sync {
    /// Stores a review. A missing body is stored as an empty string.
    async fn submit(&self, new_review: NewReview) -> Result<Review>;

    /// Newest first, `DEFAULT_REVIEW_LIMIT` when no limit is given.
    fn list(&self, restaurant_id: i32, limit: Option<i64>) -> Result<Vec<Review>>;
}
