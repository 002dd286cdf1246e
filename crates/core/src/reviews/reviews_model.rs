use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Default number of reviews returned per restaurant.
pub const DEFAULT_REVIEW_LIMIT: i64 = 50;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// A review. The reviewer is free text, not a client reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub restaurant_id: i32,
    pub reviewer_name: String,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub restaurant_id: i32,
    pub reviewer_name: String,
    pub rating: i32,
    pub review_text: Option<String>,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reviewer_name.trim().is_empty() {
            return Err(ValidationError::MissingField("reviewer_name"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange {
                min: MIN_RATING,
                max: MAX_RATING,
                actual: self.rating,
            });
        }
        Ok(())
    }
}
