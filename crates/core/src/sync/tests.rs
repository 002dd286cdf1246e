use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::*;
use crate::errors::{DatabaseError, Error, Result};
use crate::favorites::Favorite;
use crate::restaurants::Restaurant;
use crate::reviews::Review;

type Tables = HashMap<SyncTable, Vec<SyncRow>>;

fn insert_into(tables: &mut Tables, row: SyncRow) {
    tables.entry(row.table()).or_default().push(row);
}

#[derive(Default)]
struct MemoryLocal {
    tables: Mutex<Tables>,
    reject: HashSet<(SyncTable, i32)>,
}

impl MemoryLocal {
    fn with_rows(rows: Vec<SyncRow>) -> Self {
        let local = Self::default();
        {
            let mut tables = local.tables.lock().unwrap();
            for row in rows {
                insert_into(&mut tables, row);
            }
        }
        local
    }

    fn rows(&self, table: SyncTable) -> Vec<SyncRow> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LocalSyncStore for MemoryLocal {
    async fn read_all(&self, table: SyncTable) -> Result<Vec<SyncRow>> {
        Ok(self.rows(table))
    }

    async fn clear_table(&self, table: SyncTable) -> Result<usize> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .remove(&table)
            .map(|rows| rows.len())
            .unwrap_or(0))
    }

    async fn insert_row(&self, row: SyncRow) -> Result<()> {
        if self.reject.contains(&(row.table(), row.id())) {
            return Err(Error::Database(DatabaseError::ForeignKeyViolation(
                row.describe(),
            )));
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(row.table()).or_default();
        if rows.iter().any(|existing| existing.id() == row.id()) {
            return Err(Error::Database(DatabaseError::UniqueViolation(
                row.describe(),
            )));
        }
        rows.push(row);
        Ok(())
    }
}

#[derive(Default)]
struct RemoteState {
    tables: Mutex<Tables>,
    /// Remaining transient failures per row.
    failures: Mutex<HashMap<(SyncTable, i32), u32>>,
    upsert_calls: AtomicU32,
    upsert_order: Mutex<Vec<SyncTable>>,
    active: AtomicU32,
    acquisitions: AtomicU32,
    /// The row that kills whichever session upserts it.
    kill_session_on: Mutex<Option<(SyncTable, i32)>>,
    /// Refuse new connections once a session has died.
    refuse_after_kill: AtomicBool,
    refusing: AtomicBool,
    fail_read: Mutex<Option<SyncTable>>,
}

impl RemoteState {
    fn rows(&self, table: SyncTable) -> Vec<SyncRow> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    fn fail_next(&self, table: SyncTable, id: i32, times: u32) {
        self.failures.lock().unwrap().insert((table, id), times);
    }

    fn kill_session_on(&self, table: SyncTable, id: i32, refuse_reconnect: bool) {
        *self.kill_session_on.lock().unwrap() = Some((table, id));
        self.refuse_after_kill.store(refuse_reconnect, Ordering::SeqCst);
    }
}

struct MemoryRemote {
    state: Arc<RemoteState>,
    unreachable: bool,
    gate: Option<Arc<Notify>>,
}

impl MemoryRemote {
    fn new(rows: Vec<SyncRow>) -> Self {
        let state = RemoteState::default();
        {
            let mut tables = state.tables.lock().unwrap();
            for row in rows {
                insert_into(&mut tables, row);
            }
        }
        Self {
            state: Arc::new(state),
            unreachable: false,
            gate: None,
        }
    }

    fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl RemoteSyncStore for MemoryRemote {
    async fn acquire(&self) -> Result<Box<dyn RemoteSession>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.unreachable || self.state.refusing.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::ConnectionFailed(
                "connection refused".to_string(),
            )));
        }
        self.state.active.fetch_add(1, Ordering::SeqCst);
        self.state.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            dead: AtomicBool::new(false),
        }))
    }

    fn active_connections(&self) -> u32 {
        self.state.active.load(Ordering::SeqCst)
    }
}

struct MemorySession {
    state: Arc<RemoteState>,
    /// A dead session fails every call, like a closed server connection.
    dead: AtomicBool,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteSession for MemorySession {
    async fn read_all(&self, table: SyncTable) -> Result<Vec<SyncRow>> {
        if *self.state.fail_read.lock().unwrap() == Some(table) {
            return Err(Error::Database(DatabaseError::Transient(
                "statement timeout".to_string(),
            )));
        }
        Ok(self.state.rows(table))
    }

    async fn upsert(&self, row: &SyncRow) -> Result<()> {
        self.state.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.state.upsert_order.lock().unwrap().push(row.table());
        {
            let mut kill = self.state.kill_session_on.lock().unwrap();
            if *kill == Some((row.table(), row.id())) {
                kill.take();
                self.dead.store(true, Ordering::SeqCst);
                if self.state.refuse_after_kill.load(Ordering::SeqCst) {
                    self.state.refusing.store(true, Ordering::SeqCst);
                }
            }
        }
        if self.dead.load(Ordering::SeqCst) {
            return Err(Error::Database(DatabaseError::Transient(
                "server closed the connection unexpectedly".to_string(),
            )));
        }
        {
            let mut failures = self.state.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&(row.table(), row.id())) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(Error::Database(DatabaseError::Transient(
                        "connection reset".to_string(),
                    )));
                }
            }
        }
        let mut tables = self.state.tables.lock().unwrap();
        let rows = tables.entry(row.table()).or_default();
        match rows
            .iter_mut()
            .find(|existing| existing.natural_key() == row.natural_key())
        {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        Ok(())
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

fn engine(local: Arc<MemoryLocal>, remote: Arc<MemoryRemote>) -> SyncEngine {
    SyncEngine::with_retry_policy(local, remote, fast_retry())
}

fn restaurant(id: i32, email: &str) -> SyncRow {
    SyncRow::Restaurant(Restaurant {
        id,
        name: format!("Restaurant {}", id),
        tax_id: format!("tax-{}", id),
        address: Some("Rua A, 1".to_string()),
        phone: None,
        email: email.to_string(),
        password_hash: "$2b$10$hash".to_string(),
        tags: Some("a,b,c,d,e".to_string()),
        created_at: "2026-01-01T00:00:00Z".to_string(),
    })
}

fn favorite(id: i32, client_id: i32, restaurant_id: i32) -> SyncRow {
    SyncRow::Favorite(Favorite {
        id,
        client_id,
        restaurant_id,
        created_at: "2026-02-01T10:00:00Z".to_string(),
    })
}

fn review(id: i32, restaurant_id: i32, rating: i32) -> SyncRow {
    SyncRow::Review(Review {
        id,
        restaurant_id,
        reviewer_name: "Bia".to_string(),
        rating,
        review_text: Some(String::new()),
        created_at: "2026-02-02T10:00:00Z".to_string(),
    })
}

#[tokio::test]
async fn import_replaces_stale_local_rows() {
    let local = Arc::new(MemoryLocal::with_rows(vec![restaurant(3, "stale@x.com")]));
    let remote = Arc::new(MemoryRemote::new(vec![
        restaurant(1, "a@x.com"),
        restaurant(2, "b@x.com"),
    ]));

    let report = engine(local.clone(), remote.clone()).import_all().await;

    assert!(report.is_completed());
    let rows = local.rows(SyncTable::Restaurants);
    assert_eq!(rows, remote.state.rows(SyncTable::Restaurants));
    let emails = rows
        .iter()
        .map(|row| match row {
            SyncRow::Restaurant(r) => r.email.as_str(),
            _ => unreachable!(),
        })
        .collect::<Vec<_>>();
    assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    assert_eq!(report.table(SyncTable::Restaurants).unwrap().written, 2);
    assert_eq!(remote.active_connections(), 0);
}

#[tokio::test]
async fn import_skips_rows_that_fail_to_insert() {
    let mut local = MemoryLocal::default();
    local.reject.insert((SyncTable::Reviews, 11));
    let local = Arc::new(local);
    let remote = Arc::new(MemoryRemote::new(vec![
        restaurant(1, "a@x.com"),
        review(10, 1, 5),
        review(11, 99, 4),
        review(12, 1, 3),
    ]));

    let report = engine(local.clone(), remote).import_all().await;

    let reviews = report.table(SyncTable::Reviews).unwrap();
    assert_eq!((reviews.read, reviews.written, reviews.failed), (3, 2, 1));
    let ids = local
        .rows(SyncTable::Reviews)
        .iter()
        .map(SyncRow::id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![10, 12]);
    assert_eq!(local.rows(SyncTable::Restaurants).len(), 1);
}

#[tokio::test]
async fn import_connection_failure_keeps_local_rows() {
    let local = Arc::new(MemoryLocal::with_rows(vec![restaurant(1, "a@x.com")]));
    let remote = Arc::new(MemoryRemote::unreachable());

    let engine = engine(local.clone(), remote);
    let report = engine.import_all().await;

    assert!(matches!(report.status, CycleStatus::ConnectionFailed(_)));
    assert!(report.tables.is_empty());
    assert_eq!(local.rows(SyncTable::Restaurants).len(), 1);
    assert_eq!(engine.phase(), SyncPhase::Idle);
    assert!(engine.status().last_import.is_some());
}

#[tokio::test]
async fn import_read_failure_leaves_local_untouched() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        restaurant(1, "a@x.com"),
        review(7, 1, 4),
    ]));
    let remote = Arc::new(MemoryRemote::new(vec![
        restaurant(1, "a@x.com"),
        restaurant(2, "b@x.com"),
    ]));
    *remote.state.fail_read.lock().unwrap() = Some(SyncTable::Reviews);

    let engine = engine(local.clone(), remote.clone());
    let report = engine.import_all().await;

    assert!(matches!(report.status, CycleStatus::Aborted(_)));
    assert!(report.table(SyncTable::Reviews).unwrap().error.is_some());
    assert_eq!(report.written(), 0);
    assert_eq!(local.rows(SyncTable::Restaurants).len(), 1);
    assert_eq!(local.rows(SyncTable::Reviews), vec![review(7, 1, 4)]);
    assert_eq!(remote.active_connections(), 0);
    assert_eq!(engine.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn export_favorite_once_and_idempotently() {
    let local = Arc::new(MemoryLocal::with_rows(vec![favorite(1, 1, 2)]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    let engine = engine(local, remote.clone());

    let first = engine.export_all().await;
    assert!(first.is_completed());
    let rows = remote.state.rows(SyncTable::Favorites);
    assert_eq!(rows.len(), 1);
    match &rows[0] {
        SyncRow::Favorite(fav) => {
            assert_eq!((fav.client_id, fav.restaurant_id), (1, 2));
            assert!(!fav.created_at.is_empty());
        }
        other => panic!("unexpected row {:?}", other),
    }

    let second = engine.export_all().await;
    assert!(second.is_completed());
    assert_eq!(remote.state.rows(SyncTable::Favorites), rows);
}

#[tokio::test]
async fn export_updates_non_key_columns_on_conflict() {
    let mut updated = match restaurant(1, "a@x.com") {
        SyncRow::Restaurant(r) => r,
        _ => unreachable!(),
    };
    updated.name = "Renamed".to_string();
    updated.phone = Some("555-0101".to_string());

    let local = Arc::new(MemoryLocal::with_rows(vec![SyncRow::Restaurant(
        updated.clone(),
    )]));
    let remote = Arc::new(MemoryRemote::new(vec![restaurant(1, "a@x.com")]));

    engine(local, remote.clone()).export_all().await;

    assert_eq!(
        remote.state.rows(SyncTable::Restaurants),
        vec![SyncRow::Restaurant(updated)]
    );
}

#[tokio::test]
async fn export_recovers_after_transient_failures() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        review(1, 1, 5),
        review(2, 1, 4),
        review(3, 1, 3),
    ]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    remote.state.fail_next(SyncTable::Reviews, 2, 2);

    let report = engine(local, remote.clone()).export_all().await;

    let reviews = report.table(SyncTable::Reviews).unwrap();
    assert_eq!((reviews.written, reviews.failed, reviews.retries), (3, 0, 2));
    let ids = remote
        .state
        .rows(SyncTable::Reviews)
        .iter()
        .map(SyncRow::id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(remote.state.upsert_calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn export_gives_up_on_a_row_but_keeps_its_siblings() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        review(1, 1, 5),
        review(2, 1, 4),
        review(3, 1, 3),
    ]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    remote.state.fail_next(SyncTable::Reviews, 2, u32::MAX);

    let engine = engine(local, remote.clone());
    let report = engine.export_all().await;

    assert!(report.is_completed());
    let reviews = report.table(SyncTable::Reviews).unwrap();
    assert_eq!((reviews.written, reviews.failed), (2, 1));
    let ids = remote
        .state
        .rows(SyncTable::Reviews)
        .iter()
        .map(SyncRow::id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(remote.state.upsert_calls.load(Ordering::SeqCst), 5);
    assert_eq!(engine.status().consecutive_export_failures, 1);
}

#[tokio::test]
async fn export_connection_failure_writes_nothing_and_leaks_nothing() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        restaurant(1, "a@x.com"),
        favorite(1, 1, 1),
    ]));
    let remote = Arc::new(MemoryRemote::unreachable());
    let before = remote.active_connections();

    let engine = engine(local, remote.clone());
    let report = engine.export_all().await;

    assert!(matches!(report.status, CycleStatus::ConnectionFailed(_)));
    assert_eq!(report.written(), 0);
    assert_eq!(remote.state.upsert_calls.load(Ordering::SeqCst), 0);
    assert_eq!(remote.active_connections(), before);
    assert_eq!(engine.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn export_follows_table_order_and_releases_the_connection() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        review(1, 1, 5),
        favorite(1, 1, 1),
        restaurant(1, "a@x.com"),
    ]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));

    let report = engine(local, remote.clone()).export_all().await;

    assert_eq!(
        report.tables.iter().map(|t| t.table).collect::<Vec<_>>(),
        SyncTable::ORDER.to_vec()
    );
    assert_eq!(
        *remote.state.upsert_order.lock().unwrap(),
        vec![
            SyncTable::Restaurants,
            SyncTable::Favorites,
            SyncTable::Reviews
        ]
    );
    assert_eq!(remote.active_connections(), 0);
}

#[tokio::test]
async fn export_is_not_reentrant() {
    let gate = Arc::new(Notify::new());
    let local = Arc::new(MemoryLocal::with_rows(vec![restaurant(1, "a@x.com")]));
    let remote = Arc::new(MemoryRemote {
        gate: Some(gate.clone()),
        ..MemoryRemote::new(Vec::new())
    });
    let engine = Arc::new(engine(local, remote.clone()));

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.export_all().await }
    });
    for _ in 0..200 {
        if engine.phase() == SyncPhase::Connecting {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(engine.phase(), SyncPhase::Connecting);

    let second = engine.export_all().await;
    assert_eq!(second.status, CycleStatus::AlreadyRunning);

    gate.notify_one();
    let first = first.await.expect("first cycle");
    assert!(first.is_completed());
    assert_eq!(remote.state.rows(SyncTable::Restaurants).len(), 1);
}

#[tokio::test]
async fn scheduler_start_and_stop() {
    let local = Arc::new(MemoryLocal::with_rows(vec![restaurant(1, "a@x.com")]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    let engine = Arc::new(engine(local, remote.clone()));
    let scheduler = SyncScheduler::new(engine, SyncSchedule::every(Duration::from_millis(10)));

    assert!(scheduler.start().await);
    assert!(!scheduler.start().await);
    assert!(scheduler.is_running().await);

    tokio::time::sleep(Duration::from_millis(80)).await;
    scheduler.stop().await;
    assert!(!scheduler.is_running().await);

    let calls = remote.state.upsert_calls.load(Ordering::SeqCst);
    assert!(calls >= 1);
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(remote.state.upsert_calls.load(Ordering::SeqCst), calls);
    assert_eq!(remote.active_connections(), 0);
}

#[tokio::test]
async fn trigger_now_runs_a_single_cycle() {
    let local = Arc::new(MemoryLocal::with_rows(vec![favorite(4, 1, 2)]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    let scheduler = SyncScheduler::new(
        Arc::new(engine(local, remote.clone())),
        SyncSchedule::default(),
    );

    let report = scheduler.trigger_now().await.expect("report");
    assert!(report.is_completed());
    assert_eq!(report.written(), 1);
    assert!(!scheduler.is_running().await);
    assert_eq!(
        scheduler.engine().status().last_export.map(|r| r.written()),
        Some(1)
    );
}

#[tokio::test]
async fn export_reconnects_after_a_dead_connection() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        restaurant(1, "a@x.com"),
        restaurant(2, "b@x.com"),
        restaurant(3, "c@x.com"),
        restaurant(4, "d@x.com"),
    ]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    remote.state.kill_session_on(SyncTable::Restaurants, 2, false);

    let report = engine(local, remote.clone()).export_all().await;

    assert!(report.is_completed());
    let restaurants = report.table(SyncTable::Restaurants).unwrap();
    assert_eq!(
        (restaurants.written, restaurants.failed, restaurants.retries),
        (4, 0, 1)
    );
    assert_eq!(remote.state.rows(SyncTable::Restaurants).len(), 4);
    assert_eq!(remote.state.acquisitions.load(Ordering::SeqCst), 2);
    assert_eq!(remote.active_connections(), 0);
}

#[tokio::test]
async fn export_stops_when_the_remote_goes_away() {
    let local = Arc::new(MemoryLocal::with_rows(vec![
        restaurant(1, "a@x.com"),
        restaurant(2, "b@x.com"),
        restaurant(3, "c@x.com"),
        favorite(1, 1, 1),
    ]));
    let remote = Arc::new(MemoryRemote::new(Vec::new()));
    remote.state.kill_session_on(SyncTable::Restaurants, 2, true);

    let engine = engine(local, remote.clone());
    let report = engine.export_all().await;

    assert!(matches!(report.status, CycleStatus::Aborted(_)));
    assert_eq!(report.tables.len(), 1);
    let restaurants = report.table(SyncTable::Restaurants).unwrap();
    assert_eq!((restaurants.written, restaurants.failed), (1, 1));
    assert!(restaurants.error.is_some());
    assert_eq!(remote.state.upsert_calls.load(Ordering::SeqCst), 2);
    assert!(remote.state.rows(SyncTable::Favorites).is_empty());
    assert_eq!(remote.active_connections(), 0);
    assert_eq!(engine.phase(), SyncPhase::Idle);
    assert_eq!(engine.status().consecutive_export_failures, 1);
}
