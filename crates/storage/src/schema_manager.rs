//! Idempotent schema setup for both stores.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`; columns added after
//! the first release are applied additively once the live column set has been
//! inspected. Every statement failure is logged and collected into a
//! [`SchemaReport`] instead of aborting startup.

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use log::{debug, error, info};

use bistro_core::sync::SyncTable;

use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::remote::RemotePool;

/// A nullable column added to an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdditiveColumn {
    pub table: SyncTable,
    pub name: &'static str,
    pub sql_type: &'static str,
}

pub const ADDITIVE_COLUMNS: [AdditiveColumn; 2] = [
    AdditiveColumn {
        table: SyncTable::Restaurants,
        name: "address",
        sql_type: "TEXT",
    },
    AdditiveColumn {
        table: SyncTable::Restaurants,
        name: "phone",
        sql_type: "TEXT",
    },
];

const LOGGED_TABLES: [SyncTable; 2] = [SyncTable::Restaurants, SyncTable::Clients];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// `table.column` entries added during this run.
    pub added_columns: Vec<String>,
    pub errors: Vec<String>,
}

impl SchemaReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, store: &str, what: String, err: impl std::fmt::Display) {
        error!("[Schema] {} {} failed: {}", store, what, err);
        self.errors.push(format!("{}: {}", what, err));
    }
}

#[derive(Debug, Clone, QueryableByName)]
pub struct ColumnInfo {
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub column_type: String,
}

/// What differs between the two backends.
trait SchemaDialect {
    const STORE: &'static str;

    fn create_table_sql(table: SyncTable) -> &'static str;

    fn load_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, StorageError>;

    fn execute_ddl(&mut self, sql: &str) -> Result<(), StorageError>;
}

impl SchemaDialect for SqliteConnection {
    const STORE: &'static str = "local";

    fn create_table_sql(table: SyncTable) -> &'static str {
        match table {
            SyncTable::Restaurants => {
                "CREATE TABLE IF NOT EXISTS restaurants (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    tax_id TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    tags TEXT,
                    created_at TEXT NOT NULL
                )"
            }
            SyncTable::Clients => {
                "CREATE TABLE IF NOT EXISTS clients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    national_id TEXT NOT NULL UNIQUE,
                    phone TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    tags TEXT,
                    created_at TEXT NOT NULL
                )"
            }
            SyncTable::Favorites => {
                "CREATE TABLE IF NOT EXISTS favorites (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                    restaurant_id INTEGER NOT NULL REFERENCES restaurants(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    UNIQUE (client_id, restaurant_id)
                )"
            }
            SyncTable::Reviews => {
                "CREATE TABLE IF NOT EXISTS reviews (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    restaurant_id INTEGER NOT NULL REFERENCES restaurants(id) ON DELETE CASCADE,
                    reviewer_name TEXT NOT NULL,
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    review_text TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reviews_restaurant_id ON reviews(restaurant_id)"
            }
            SyncTable::Reports => {
                "CREATE TABLE IF NOT EXISTS reports (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    restaurant_id INTEGER NOT NULL REFERENCES restaurants(id) ON DELETE CASCADE,
                    analysis TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reports_restaurant_id ON reports(restaurant_id)"
            }
        }
    }

    fn load_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, StorageError> {
        let columns = diesel::sql_query(
            "SELECT name, type AS column_type FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind::<Text, _>(table)
        .load::<ColumnInfo>(self)?;
        Ok(columns)
    }

    fn execute_ddl(&mut self, sql: &str) -> Result<(), StorageError> {
        self.batch_execute(sql)?;
        Ok(())
    }
}

// Remote ids are assigned by the local store, so they are plain integers here.
impl SchemaDialect for PgConnection {
    const STORE: &'static str = "remote";

    fn create_table_sql(table: SyncTable) -> &'static str {
        match table {
            SyncTable::Restaurants => {
                "CREATE TABLE IF NOT EXISTS restaurants (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    tax_id TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    tags TEXT,
                    created_at TEXT NOT NULL
                )"
            }
            SyncTable::Clients => {
                "CREATE TABLE IF NOT EXISTS clients (
                    id INTEGER PRIMARY KEY,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    national_id TEXT NOT NULL UNIQUE,
                    phone TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    tags TEXT,
                    created_at TEXT NOT NULL
                )"
            }
            SyncTable::Favorites => {
                "CREATE TABLE IF NOT EXISTS favorites (
                    id INTEGER PRIMARY KEY,
                    client_id INTEGER NOT NULL
                        REFERENCES clients(id) ON DELETE CASCADE ON UPDATE CASCADE,
                    restaurant_id INTEGER NOT NULL
                        REFERENCES restaurants(id) ON DELETE CASCADE ON UPDATE CASCADE,
                    created_at TEXT NOT NULL,
                    UNIQUE (client_id, restaurant_id)
                )"
            }
            SyncTable::Reviews => {
                "CREATE TABLE IF NOT EXISTS reviews (
                    id INTEGER PRIMARY KEY,
                    restaurant_id INTEGER NOT NULL
                        REFERENCES restaurants(id) ON DELETE CASCADE ON UPDATE CASCADE,
                    reviewer_name TEXT NOT NULL,
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    review_text TEXT,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reviews_restaurant_id ON reviews(restaurant_id)"
            }
            SyncTable::Reports => {
                "CREATE TABLE IF NOT EXISTS reports (
                    id INTEGER PRIMARY KEY,
                    restaurant_id INTEGER NOT NULL
                        REFERENCES restaurants(id) ON DELETE CASCADE ON UPDATE CASCADE,
                    analysis TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_reports_restaurant_id ON reports(restaurant_id)"
            }
        }
    }

    fn load_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, StorageError> {
        let columns = diesel::sql_query(
            "SELECT column_name::text AS name, data_type::text AS column_type
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind::<Text, _>(table)
        .load::<ColumnInfo>(self)?;
        Ok(columns)
    }

    fn execute_ddl(&mut self, sql: &str) -> Result<(), StorageError> {
        self.batch_execute(sql)?;
        Ok(())
    }
}

fn ensure_schema<C: SchemaDialect>(conn: &mut C) -> SchemaReport {
    let store = C::STORE;
    let mut report = SchemaReport::default();

    for table in SyncTable::ORDER {
        match conn.execute_ddl(C::create_table_sql(table)) {
            Ok(()) => debug!("[Schema] {} table {} ready", store, table),
            Err(err) => report.fail(store, format!("create table {}", table), err),
        }
    }

    for column in ADDITIVE_COLUMNS {
        let existing = match conn.load_columns(column.table.name()) {
            Ok(columns) => columns,
            Err(err) => {
                report.fail(store, format!("inspect {}", column.table), err);
                continue;
            }
        };
        if existing.iter().any(|c| c.name == column.name) {
            continue;
        }
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            column.table.name(),
            column.name,
            column.sql_type
        );
        match conn.execute_ddl(&sql) {
            Ok(()) => {
                info!("[Schema] Added {} column {}.{}", store, column.table, column.name);
                report
                    .added_columns
                    .push(format!("{}.{}", column.table, column.name));
            }
            Err(err) => report.fail(
                store,
                format!("add column {}.{}", column.table, column.name),
                err,
            ),
        }
    }

    for table in LOGGED_TABLES {
        match conn.load_columns(table.name()) {
            Ok(columns) => info!(
                "[Schema] {} {} columns: {}",
                store,
                table,
                describe_columns(&columns)
            ),
            Err(err) => report.fail(store, format!("inspect {}", table), err),
        }
    }

    if report.is_clean() {
        info!("[Schema] {} schema ready", store);
    }
    report
}

fn describe_columns(columns: &[ColumnInfo]) -> String {
    columns
        .iter()
        .map(|c| format!("{} ({})", c.name, c.column_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Creates or upgrades the local SQLite schema.
pub fn ensure_local_schema(pool: &DbPool) -> SchemaReport {
    match get_connection(pool) {
        Ok(mut conn) => ensure_schema::<SqliteConnection>(&mut conn),
        Err(err) => {
            let mut report = SchemaReport::default();
            report.fail("local", "connect".to_string(), err);
            report
        }
    }
}

/// Creates or upgrades the remote PostgreSQL schema.
pub async fn ensure_remote_schema(pool: &RemotePool) -> SchemaReport {
    let pool = pool.clone();
    let joined = tokio::task::spawn_blocking(move || match pool.get() {
        Ok(mut conn) => ensure_schema::<PgConnection>(&mut conn),
        Err(err) => {
            let mut report = SchemaReport::default();
            report.fail("remote", "connect".to_string(), err);
            report
        }
    })
    .await;

    joined.unwrap_or_else(|err| {
        let mut report = SchemaReport::default();
        report.fail("remote", "schema task".to_string(), err);
        report
    })
}
