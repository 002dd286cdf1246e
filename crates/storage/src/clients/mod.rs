mod model;
mod repository;

pub use model::{ClientDB, NewClientDB};
pub use repository::ClientRepository;
