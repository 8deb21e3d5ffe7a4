//! SQLite-backed record log.
//!
//! One worker thread owns the `Connection`. Async callers hand it closures over a channel and
//! await the result on a oneshot, so disk I/O never runs on the runtime's threads.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

pub mod helpers;
mod migrations;
pub mod repositories;

pub const DB_FILE_NAME: &str = "airvitals.sqlite3";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Task = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Job {
    Run(Task),
    Stop,
}

/// Owns the worker thread; stopping and joining it happens when the last `Database` clone goes.
struct Worker {
    jobs: mpsc::Sender<Job>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else { return };

        if self.jobs.send(Job::Stop).is_err() {
            error!("Record log worker already gone at shutdown");
        }
        if let Err(err) = handle.join() {
            error!("Record log worker panicked: {err:?}");
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;

    migrations::run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve(mut conn: Connection, jobs: mpsc::Receiver<Job>) {
    for job in jobs {
        match job {
            Job::Run(task) => task(&mut conn),
            Job::Stop => break,
        }
    }
    info!("Record log worker stopped");
}

#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

impl Database {
    /// Opens `path`, creating parent directories and applying pending migrations before
    /// returning.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let thread_path = path.clone();

        let handle = thread::Builder::new()
            .name("airvitals-db".into())
            .spawn(move || match open_connection(&thread_path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(conn, jobs_rx);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn record log worker")?;

        ready_rx
            .recv()
            .context("record log worker exited before it was ready")??;

        info!("Record log opened at {}", path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                jobs: jobs_tx,
                handle: Mutex::new(Some(handle)),
            }),
            path: Arc::new(path),
        })
    }

    /// Opens the standard database file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> Result<Self> {
        Self::new(data_dir.join(DB_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `task` on the worker thread and returns its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let job = Job::Run(Box::new(move |conn| {
            // The caller may have been dropped mid-await; nothing to report then.
            let _ = reply_tx.send(task(conn));
        }));

        self.worker
            .jobs
            .send(job)
            .map_err(|_| anyhow!("record log worker is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("record log worker dropped the request"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");

        let db = Database::open_in(&data_dir).unwrap();
        assert_eq!(db.path(), data_dir.join(DB_FILE_NAME));
        assert!(db.path().exists());
    }

    #[tokio::test]
    async fn execute_returns_task_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in(dir.path()).unwrap();

        let count: i64 = db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);

        let failed = db
            .execute(|conn| Ok(conn.execute("SELECT * FROM missing_table", [])?))
            .await;
        assert!(failed.is_err());
    }

    #[tokio::test]
    async fn clones_share_one_worker() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in(dir.path()).unwrap();
        let other = db.clone();
        drop(db);

        let version: i32 = other
            .execute(|conn| Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(version, 1);
    }
}
