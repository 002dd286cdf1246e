//! Restaurant accounts and listing summaries.

mod restaurants_model;
mod restaurants_traits;

pub use restaurants_model::*;
pub use restaurants_traits::*;
