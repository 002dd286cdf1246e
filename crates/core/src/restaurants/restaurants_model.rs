use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::tags::{parse_tags, validate_registration_tags};

/// Restaurant row as stored in both the local and the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i32,
    pub name: String,
    pub tax_id: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub tags: Option<String>,
    pub created_at: String,
}

impl Restaurant {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.as_deref().map(parse_tags).unwrap_or_default()
    }
}

/// Registration payload. The password arrives already hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub name: String,
    pub tax_id: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub tags: String,
}

impl NewRestaurant {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.tax_id.trim().is_empty() {
            return Err(ValidationError::MissingField("tax_id"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        validate_registration_tags(&self.tags)
    }
}

/// Listing row with aggregated review data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub tags: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

/// Listing filters. `id` wins over `search`; `random` is ignored when searching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantQuery {
    pub id: Option<i32>,
    pub search: Option<String>,
    #[serde(default)]
    pub random: bool,
    pub limit: Option<i64>,
}

/// Rounds an average rating to one decimal place.
pub fn round_rating(average: f64) -> f64 {
    (average * 10.0).round() / 10.0
}
