//! Periodic export task with an explicit start/stop lifecycle.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::sync_engine::{CycleReport, SyncEngine};
use super::sync_retry::RetryPolicy;
use crate::errors::Error;

/// Export cadence, written as a cron minute step (`*/5 * * * *`) or seconds (`300`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSchedule {
    interval: Duration,
}

impl SyncSchedule {
    pub const DEFAULT_EXPRESSION: &'static str = "*/5 * * * *";

    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SyncSchedule {
    fn default() -> Self {
        Self::every(Duration::from_secs(5 * 60))
    }
}

impl FromStr for SyncSchedule {
    type Err = Error;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let expression = expression.trim();
        let invalid = || Error::Config(format!("Unsupported sync schedule '{}'", expression));

        if !expression.is_empty() && expression.chars().all(|c| c.is_ascii_digit()) {
            let seconds: u64 = expression.parse().map_err(|_| invalid())?;
            if seconds == 0 {
                return Err(invalid());
            }
            return Ok(Self::every(Duration::from_secs(seconds)));
        }

        let fields = expression.split_whitespace().collect::<Vec<_>>();
        if fields.len() != 5 || fields[1..].iter().any(|field| *field != "*") {
            return Err(invalid());
        }
        let minutes: u64 = match fields[0] {
            "*" => 1,
            step => step
                .strip_prefix("*/")
                .and_then(|n| n.parse().ok())
                .filter(|n| (1..=59).contains(n))
                .ok_or_else(invalid)?,
        };
        Ok(Self::every(Duration::from_secs(minutes * 60)))
    }
}

/// Sync settings shared by the engine and the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncConfig {
    pub schedule: SyncSchedule,
    pub retry: RetryPolicy,
}

/// Runs one export cycle on its own task so a panic cannot take down the caller.
pub async fn run_export_cycle(engine: Arc<SyncEngine>) -> Option<CycleReport> {
    match tokio::spawn(async move { engine.export_all().await }).await {
        Ok(report) => Some(report),
        Err(err) => {
            error!("[Sync] Export cycle aborted: {}", err);
            None
        }
    }
}

struct BackgroundTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Owns the background export loop.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    schedule: SyncSchedule,
    background_task: Mutex<Option<BackgroundTask>>,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, schedule: SyncSchedule) -> Self {
        Self {
            engine,
            schedule,
            background_task: Mutex::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Starts the loop. Returns `false` when it was already running.
    ///
    /// The first export fires one interval after start, cycles never overlap.
    pub async fn start(&self) -> bool {
        let mut guard = self.background_task.lock().await;
        if let Some(task) = guard.as_ref() {
            if !task.handle.is_finished() {
                return false;
            }
            guard.take();
        }

        let engine = Arc::clone(&self.engine);
        let period = self.schedule.interval();
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }
                if let Some(report) = run_export_cycle(Arc::clone(&engine)).await {
                    if !report.is_completed() {
                        warn!("[Sync] Export cycle did not complete: {:?}", report.status);
                    }
                }
            }
        });
        info!("[Sync] Background export started, every {:?}", period);
        *guard = Some(BackgroundTask { handle, shutdown });
        true
    }

    /// Stops the loop, waiting for an in-flight cycle to drain first.
    pub async fn stop(&self) {
        let mut guard = self.background_task.lock().await;
        if let Some(task) = guard.take() {
            let _ = task.shutdown.send(true);
            if let Err(err) = task.handle.await {
                error!("[Sync] Background export ended abnormally: {}", err);
            }
            info!("[Sync] Background export stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.background_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Runs an export right away, outside the timer.
    pub async fn trigger_now(&self) -> Option<CycleReport> {
        run_export_cycle(Arc::clone(&self.engine)).await
    }
}
