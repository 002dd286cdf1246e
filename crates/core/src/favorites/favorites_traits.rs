use async_trait::async_trait;

use super::FavoriteAction;
use crate::errors::Result;
use crate::restaurants::RestaurantSummary;

#[async_trait]
pub trait FavoriteRepositoryTrait: Send + Sync {
    /// Adds a favorite. Returns `false` when the pair already existed.
    ///
    /// Fails with `NotFound` when the restaurant does not exist.
    async fn add(&self, client_id: i32, restaurant_id: i32) -> Result<bool>;

    /// Removes a favorite, failing with `NotFound` when there was none.
    async fn remove(&self, client_id: i32, restaurant_id: i32) -> Result<()>;

    fn list_ids(&self, client_id: i32) -> Result<Vec<i32>>;

    fn list_restaurants(&self, client_id: i32) -> Result<Vec<RestaurantSummary>>;

    async fn toggle(
        &self,
        client_id: i32,
        restaurant_id: i32,
        action: FavoriteAction,
    ) -> Result<()> {
        match action {
            FavoriteAction::Add => self.add(client_id, restaurant_id).await.map(|_| ()),
            FavoriteAction::Remove => self.remove(client_id, restaurant_id).await,
        }
    }
}
