use std::sync::Arc;

use tempfile::TempDir;

use crate::db::{self, DbPool, WriteHandle};
use crate::schema_manager::ensure_local_schema;

/// Empty database file in a fresh temporary directory.
pub fn setup_pool() -> (TempDir, Arc<DbPool>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let data_dir = dir.path().to_string_lossy().into_owned();
    let db_path = db::init(&data_dir).expect("init");
    let pool = db::create_pool(&db_path).expect("pool");
    (dir, pool)
}

/// Database with the full schema and a running writer.
pub fn setup_db() -> (TempDir, Arc<DbPool>, WriteHandle) {
    let (dir, pool) = setup_pool();
    let report = ensure_local_schema(&pool);
    assert!(report.is_clean(), "{:?}", report.errors);
    let writer = db::spawn_writer(pool.as_ref().clone());
    (dir, pool, writer)
}
