mod model;
mod repository;

pub use model::{NewReviewDB, ReviewDB};
pub use repository::ReviewRepository;
