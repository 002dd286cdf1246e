use async_trait::async_trait;

use super::{NewRestaurant, Restaurant, RestaurantQuery, RestaurantSummary};
use crate::errors::Result;

#[async_trait]
pub trait RestaurantRepositoryTrait: Send + Sync {
    /// Registers a restaurant, rejecting a duplicate email.
    async fn register(&self, new_restaurant: NewRestaurant) -> Result<Restaurant>;
    fn get_by_id(&self, restaurant_id: i32) -> Result<Option<Restaurant>>;
    fn get_by_email(&self, email: &str) -> Result<Option<Restaurant>>;
    fn search(&self, query: &RestaurantQuery) -> Result<Vec<RestaurantSummary>>;
    fn get_tags(&self, restaurant_id: i32) -> Result<Vec<String>>;
    /// Deletes a restaurant together with its favorites, reviews and reports.
    async fn delete(&self, restaurant_id: i32) -> Result<usize>;
}
