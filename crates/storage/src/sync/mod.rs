//! Replication adapters for the local store.

mod local_store;
mod rows;

pub use local_store::SqliteSyncStore;
pub(crate) use rows::load_sync_rows;
