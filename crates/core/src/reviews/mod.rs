//! Restaurant reviews.

mod reviews_model;
mod reviews_traits;

pub use reviews_model::*;
pub use reviews_traits::*;
