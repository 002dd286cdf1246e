use super::ClientRepositoryTrait;
use crate::errors::Result;
use crate::restaurants::{RestaurantQuery, RestaurantRepositoryTrait, RestaurantSummary};
use crate::tags::matches_any_tag;

/// Restaurants whose tags overlap the client's tags.
///
/// A client without tags (or an unknown client id) sees every restaurant.
pub fn discovery_feed(
    clients: &dyn ClientRepositoryTrait,
    restaurants: &dyn RestaurantRepositoryTrait,
    client_id: i32,
) -> Result<Vec<RestaurantSummary>> {
    let client_tags = clients
        .get_by_id(client_id)?
        .map(|client| client.tag_list())
        .unwrap_or_default();

    let all = restaurants.search(&RestaurantQuery::default())?;
    if client_tags.is_empty() {
        return Ok(all);
    }

    Ok(all
        .into_iter()
        .filter(|summary| {
            summary
                .tags
                .as_deref()
                .is_some_and(|tags| matches_any_tag(tags, &client_tags))
        })
        .collect())
}
