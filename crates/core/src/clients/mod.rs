//! Client accounts and the tag-driven discovery feed.

mod clients_model;
mod clients_traits;
mod discovery;

pub use clients_model::*;
pub use clients_traits::*;
pub use discovery::discovery_feed;
