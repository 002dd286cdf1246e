//! Local ↔ remote replication: table registry, ports, engine and scheduler.

pub mod ports;
mod sync_engine;
mod sync_retry;
mod sync_scheduler;
mod sync_tables;

pub use ports::{LocalSyncStore, RemoteSession, RemoteSyncStore};
pub use sync_engine::*;
pub use sync_retry::*;
pub use sync_scheduler::*;
pub use sync_tables::*;

#[cfg(test)]
mod tests;
