//! Replication between the local store and the remote system of record.
//!
//! Import (remote → local) reads the full remote snapshot, then replaces each
//! local table with it. Export (local → remote) upserts every local row
//! against the table's natural key, retrying transient failures per row. Both
//! run table by table in [`SyncTable::ORDER`] and never let a failure escape
//! the cycle: the outcome is always a [`CycleReport`].

use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::ports::{LocalSyncStore, RemoteSession, RemoteSyncStore};
use super::sync_retry::{retry_with_backoff, RetryPolicy};
use super::{SyncRow, SyncTable};
use crate::errors::{Result, RetryClass};

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "table")]
pub enum SyncPhase {
    Idle,
    Connecting,
    ReadingRemote(SyncTable),
    ReplacingLocal(SyncTable),
    ReadingLocal(SyncTable),
    Upserting(SyncTable),
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    Import,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum CycleStatus {
    Completed,
    /// Another cycle held the engine.
    AlreadyRunning,
    /// The remote store could not be reached; nothing was written.
    ConnectionFailed(String),
    /// The cycle stopped early. Table reports show how far it got.
    Aborted(String),
}

/// Per-table counters for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub table: SyncTable,
    pub read: usize,
    pub written: usize,
    pub failed: usize,
    /// Extra attempts spent on rows that needed retries.
    pub retries: u32,
    /// Set when the table as a whole could not be processed.
    pub error: Option<String>,
}

impl TableReport {
    fn new(table: SyncTable) -> Self {
        Self {
            table,
            read: 0,
            written: 0,
            failed: 0,
            retries: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub kind: CycleKind,
    pub status: CycleStatus,
    pub started_at: String,
    pub duration_ms: i64,
    pub tables: Vec<TableReport>,
}

impl CycleReport {
    pub fn is_completed(&self) -> bool {
        self.status == CycleStatus::Completed
    }

    pub fn written(&self) -> usize {
        self.tables.iter().map(|t| t.written).sum()
    }

    pub fn failed(&self) -> usize {
        self.tables.iter().map(|t| t.failed).sum()
    }

    pub fn table(&self, table: SyncTable) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == table)
    }
}

/// Lightweight engine status for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub phase: SyncPhase,
    pub last_import: Option<CycleReport>,
    pub last_export: Option<CycleReport>,
    pub consecutive_export_failures: u32,
}

struct EngineState {
    phase: SyncPhase,
    last_import: Option<CycleReport>,
    last_export: Option<CycleReport>,
    consecutive_export_failures: u32,
}

/// The remote connection an export cycle works on.
///
/// A connection that failed with a retryable error may be dead (a closed
/// PostgreSQL connection never recovers), so it goes back to the pool and the
/// next call checks out a fresh one.
struct SessionSlot<'a> {
    remote: &'a dyn RemoteSyncStore,
    current: Mutex<Option<Arc<dyn RemoteSession>>>,
}

impl<'a> SessionSlot<'a> {
    fn new(remote: &'a dyn RemoteSyncStore) -> Self {
        Self {
            remote,
            current: Mutex::new(None),
        }
    }

    async fn session(&self) -> Result<Arc<dyn RemoteSession>> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session: Arc<dyn RemoteSession> = Arc::from(self.remote.acquire().await?);
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn upsert(&self, row: &SyncRow) -> Result<()> {
        let session = self.session().await?;
        let result = session.upsert(row).await;
        if let Err(err) = &result {
            if err.retry_class() == RetryClass::Retryable {
                drop(session);
                debug!("[Sync] Dropping remote connection after: {}", err);
                self.release().await;
            }
        }
        result
    }

    async fn release(&self) {
        self.current.lock().await.take();
    }
}

pub struct SyncEngine {
    local: Arc<dyn LocalSyncStore>,
    remote: Arc<dyn RemoteSyncStore>,
    retry: RetryPolicy,
    cycle_mutex: Mutex<()>,
    state: RwLock<EngineState>,
}

impl SyncEngine {
    pub fn new(local: Arc<dyn LocalSyncStore>, remote: Arc<dyn RemoteSyncStore>) -> Self {
        Self::with_retry_policy(local, remote, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        local: Arc<dyn LocalSyncStore>,
        remote: Arc<dyn RemoteSyncStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            local,
            remote,
            retry,
            cycle_mutex: Mutex::new(()),
            state: RwLock::new(EngineState {
                phase: SyncPhase::Idle,
                last_import: None,
                last_export: None,
                consecutive_export_failures: 0,
            }),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.read().unwrap_or_else(|e| e.into_inner()).phase
    }

    pub fn status(&self) -> SyncEngineStatus {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        SyncEngineStatus {
            phase: state.phase,
            last_import: state.last_import.clone(),
            last_export: state.last_export.clone(),
            consecutive_export_failures: state.consecutive_export_failures,
        }
    }

    fn set_phase(&self, phase: SyncPhase) {
        debug!("[Sync] phase -> {:?}", phase);
        self.state.write().unwrap_or_else(|e| e.into_inner()).phase = phase;
    }

    fn record(&self, report: &CycleReport) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        match report.kind {
            CycleKind::Import => state.last_import = Some(report.clone()),
            CycleKind::Export => {
                if report.is_completed() && report.failed() == 0 {
                    state.consecutive_export_failures = 0;
                } else if report.status != CycleStatus::AlreadyRunning {
                    state.consecutive_export_failures += 1;
                }
                state.last_export = Some(report.clone());
            }
        }
    }

    /// Replaces every local table with the remote snapshot.
    ///
    /// Every remote table is read before the local store is touched. If any
    /// read fails, the local store is left as it was. Waits for a running
    /// cycle to finish first.
    pub async fn import_all(&self) -> CycleReport {
        let _cycle = self.cycle_mutex.lock().await;
        let started_at = Utc::now().to_rfc3339();
        let timer = Instant::now();
        info!("[Sync] Import started");

        self.set_phase(SyncPhase::Connecting);
        let session = match self.remote.acquire().await {
            Ok(session) => session,
            Err(err) => {
                error!("[Sync] Import aborted, remote unavailable: {}", err);
                return self.finish(
                    CycleKind::Import,
                    CycleStatus::ConnectionFailed(err.to_string()),
                    started_at,
                    timer,
                    Vec::new(),
                );
            }
        };

        let mut tables = Vec::with_capacity(SyncTable::ORDER.len());
        let mut snapshot = Vec::with_capacity(SyncTable::ORDER.len());
        let mut read_failure = None;
        for table in SyncTable::ORDER {
            let mut report = TableReport::new(table);
            self.set_phase(SyncPhase::ReadingRemote(table));
            match session.read_all(table).await {
                Ok(rows) => {
                    report.read = rows.len();
                    snapshot.push(rows);
                }
                Err(err) => {
                    error!("[Sync] Failed to read remote table {}: {}", table, err);
                    report.error = Some(err.to_string());
                    read_failure.get_or_insert_with(|| format!("{}: {}", table, err));
                    snapshot.push(Vec::new());
                }
            }
            tables.push(report);
        }
        drop(session);
        self.set_phase(SyncPhase::Released);

        if let Some(reason) = read_failure {
            error!("[Sync] Import aborted, local store left untouched");
            return self.finish(
                CycleKind::Import,
                CycleStatus::Aborted(reason),
                started_at,
                timer,
                tables,
            );
        }

        // Children first, so a parent delete never cascades into a table
        // that has not been counted yet.
        for report in tables.iter_mut().rev() {
            self.set_phase(SyncPhase::ReplacingLocal(report.table));
            match self.local.clear_table(report.table).await {
                Ok(removed) => {
                    debug!("[Sync] Cleared {} local rows from {}", removed, report.table)
                }
                Err(err) => {
                    error!(
                        "[Sync] Failed to clear local table {}: {}",
                        report.table, err
                    );
                    report.error = Some(err.to_string());
                }
            }
        }

        for (report, rows) in tables.iter_mut().zip(snapshot) {
            if report.error.is_some() {
                continue;
            }
            self.set_phase(SyncPhase::ReplacingLocal(report.table));
            self.insert_snapshot(report, rows).await;
        }

        self.finish(
            CycleKind::Import,
            CycleStatus::Completed,
            started_at,
            timer,
            tables,
        )
    }

    async fn insert_snapshot(&self, report: &mut TableReport, rows: Vec<SyncRow>) {
        for row in rows {
            let label = row.describe();
            match self.local.insert_row(row).await {
                Ok(()) => report.written += 1,
                Err(err) => {
                    warn!("[Sync] Skipping import of {}: {}", label, err);
                    report.failed += 1;
                }
            }
        }
        info!(
            "[Sync] Imported {}/{} rows into {}",
            report.written, report.read, report.table
        );
    }

    /// Upserts every local row into the remote store.
    ///
    /// Returns immediately with [`CycleStatus::AlreadyRunning`] when another
    /// cycle holds the engine. A connection that fails with a retryable
    /// error is given back to the pool and the next attempt checks out a
    /// fresh one. When no connection can be had at all, the rest of the
    /// cycle is abandoned.
    pub async fn export_all(&self) -> CycleReport {
        let started_at = Utc::now().to_rfc3339();
        let timer = Instant::now();
        let Ok(_cycle) = self.cycle_mutex.try_lock() else {
            info!("[Sync] Export skipped, a cycle is already running");
            let report = CycleReport {
                kind: CycleKind::Export,
                status: CycleStatus::AlreadyRunning,
                started_at,
                duration_ms: 0,
                tables: Vec::new(),
            };
            self.record(&report);
            return report;
        };
        debug!("[Sync] Export started");

        self.set_phase(SyncPhase::Connecting);
        let slot = SessionSlot::new(self.remote.as_ref());
        if let Err(err) = slot.session().await {
            error!("[Sync] Export cycle skipped, remote unavailable: {}", err);
            return self.finish(
                CycleKind::Export,
                CycleStatus::ConnectionFailed(err.to_string()),
                started_at,
                timer,
                Vec::new(),
            );
        }

        let mut status = CycleStatus::Completed;
        let mut tables = Vec::with_capacity(SyncTable::ORDER.len());
        for table in SyncTable::ORDER {
            let (report, lost) = self.export_table(&slot, table).await;
            tables.push(report);
            if let Some(reason) = lost {
                error!(
                    "[Sync] Export aborted at {}, remote unavailable: {}",
                    table, reason
                );
                status = CycleStatus::Aborted(reason);
                break;
            }
        }
        slot.release().await;
        self.set_phase(SyncPhase::Released);

        self.finish(CycleKind::Export, status, started_at, timer, tables)
    }

    /// Returns the table report, plus the reason when the remote store
    /// stopped handing out connections midway.
    async fn export_table(
        &self,
        slot: &SessionSlot<'_>,
        table: SyncTable,
    ) -> (TableReport, Option<String>) {
        let mut report = TableReport::new(table);

        self.set_phase(SyncPhase::ReadingLocal(table));
        let rows = match self.local.read_all(table).await {
            Ok(rows) => rows,
            Err(err) => {
                error!("[Sync] Failed to read local table {}: {}", table, err);
                report.error = Some(err.to_string());
                return (report, None);
            }
        };
        report.read = rows.len();

        self.set_phase(SyncPhase::Upserting(table));
        for row in &rows {
            let label = row.describe();
            let outcome =
                retry_with_backoff(&self.retry, &label, move |_| slot.upsert(row)).await;
            report.retries += outcome.attempts.saturating_sub(1);
            match outcome.result {
                Ok(()) => report.written += 1,
                Err(err) => {
                    error!(
                        "[Sync] Giving up on {} after {} attempt(s): {}",
                        label, outcome.attempts, err
                    );
                    report.failed += 1;
                    if err.is_connection_failure() {
                        report.error = Some(err.to_string());
                        return (report, Some(err.to_string()));
                    }
                }
            }
        }

        debug!(
            "[Sync] Exported {}/{} rows from {} ({} failed)",
            report.written, report.read, table, report.failed
        );
        (report, None)
    }

    fn finish(
        &self,
        kind: CycleKind,
        status: CycleStatus,
        started_at: String,
        timer: Instant,
        tables: Vec<TableReport>,
    ) -> CycleReport {
        let report = CycleReport {
            kind,
            status,
            started_at,
            duration_ms: timer.elapsed().as_millis() as i64,
            tables,
        };
        if report.is_completed() {
            info!(
                "[Sync] {:?} complete: written={} failed={} duration_ms={}",
                kind,
                report.written(),
                report.failed(),
                report.duration_ms
            );
        }
        self.record(&report);
        self.set_phase(SyncPhase::Idle);
        report
    }
}
