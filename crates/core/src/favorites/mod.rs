//! Client ↔ restaurant favorites.

mod favorites_model;
mod favorites_traits;

pub use favorites_model::*;
pub use favorites_traits::*;
