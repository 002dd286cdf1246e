//! Diesel storage for Bistro.
//!
//! Two stores live here:
//! - the **local** SQLite database that serves every application read and
//!   write (repositories, [`db`], [`sync::SqliteSyncStore`]);
//! - the **remote** PostgreSQL system of record, only ever written by the
//!   replication engine ([`remote`]).
//!
//! ```text
//!   repositories ──► local SQLite ◄── import ──┐
//!                         │                    │
//!                         └──── export ──► remote PostgreSQL
//! ```
//!
//! This crate is the only place where Diesel appears; `bistro-core` works
//! with its traits.

pub mod db;
pub mod errors;
pub mod remote;
pub mod schema;
pub mod schema_manager;
pub mod sync;

// Repository implementations
pub mod clients;
pub mod favorites;
pub mod reports;
pub mod restaurants;
pub mod reviews;

#[cfg(test)]
pub(crate) mod test_support;

pub use db::{
    create_pool, get_connection, get_db_path, init, spawn_writer, DbConnection, DbPool, WriteHandle,
};
pub use errors::{IntoCore, StorageError};
pub use remote::{PgSyncStore, RemoteConfig, RemotePool};
pub use schema_manager::{ensure_local_schema, ensure_remote_schema, SchemaReport};
pub use sync::SqliteSyncStore;
