mod model;
mod repository;

pub use model::{FavoriteDB, NewFavoriteDB};
pub use repository::FavoriteRepository;
