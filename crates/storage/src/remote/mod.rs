//! PostgreSQL system of record, reached only by the replication engine.

mod pool;
mod store;
mod upsert;

pub use pool::{with_ssl_mode, PgPooledConnection, RemoteConfig, RemotePool};
pub use store::{PgSession, PgSyncStore};
