use async_trait::async_trait;

use super::{Client, NewClient};
use crate::errors::Result;

#[async_trait]
pub trait ClientRepositoryTrait: Send + Sync {
    /// Registers a client, rejecting a duplicate email or national id.
    async fn register(&self, new_client: NewClient) -> Result<Client>;
    fn get_by_id(&self, client_id: i32) -> Result<Option<Client>>;
    fn get_by_email(&self, email: &str) -> Result<Option<Client>>;
    /// Deletes a client together with its favorites.
    async fn delete(&self, client_id: i32) -> Result<usize>;
}
