//! Serializes every local write through one dedicated connection.
//!
//! SQLite allows a single writer at a time. Instead of letting pooled
//! connections fight over the lock, write jobs are queued to a thread that
//! owns one connection and runs them in arrival order.

use std::sync::mpsc;
use std::thread;

use diesel::sqlite::SqliteConnection;
use log::{debug, error};
use tokio::sync::oneshot;

use bistro_core::Result;

use super::DbPool;
use crate::errors::StorageError;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<Job>,
}

pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (tx, rx) = mpsc::channel::<Job>();
    let spawned = thread::Builder::new()
        .name("bistro-db-writer".to_string())
        .spawn(move || {
            let mut conn = match pool.get() {
                Ok(conn) => conn,
                Err(err) => {
                    error!("Database writer could not open a connection: {}", err);
                    return;
                }
            };
            while let Ok(job) = rx.recv() {
                job(&mut conn);
            }
            debug!("Database writer stopped");
        });
    if let Err(err) = spawned {
        error!("Failed to start the database writer: {}", err);
    }
    WriteHandle { tx }
}

impl WriteHandle {
    /// Runs `job` on the writer connection and waits for its result.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Box::new(move |conn| {
                let _ = reply_tx.send(job(conn));
            }))
            .map_err(|_| StorageError::Writer("writer thread is not running".to_string()))?;

        reply_rx
            .await
            .map_err(|_| StorageError::Writer("writer dropped the job".to_string()))?
    }
}
