//! Business analysis reports attached to restaurants.

mod reports_model;
mod reports_traits;

pub use reports_model::*;
pub use reports_traits::*;
