mod model;
mod repository;
pub(crate) mod summary;

pub use model::{NewRestaurantDB, RestaurantDB};
pub use repository::RestaurantRepository;
