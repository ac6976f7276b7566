// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lifecycle for commands that run jobs: state lock, logging,
//! store recovery and periodic checkpoints.

use crate::config::Config;
use fs2::FileExt;
use rpk_adapters::{CommandAdapter, TracedProcess};
use rpk_core::{SystemClock, UuidIdGen};
use rpk_engine::{Broadcaster, Supervisor, SupervisorDeps, SupervisorError, WalJobStore};
use rpk_storage::{Store, StoreError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How often the store is compacted while jobs run
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Marker appended to the log before the subscriber starts
const STARTUP_MARKER_PREFIX: &str = "--- rpk: starting (pid: ";

pub type JobSupervisor =
    Supervisor<TracedProcess<CommandAdapter>, WalJobStore, SystemClock, UuidIdGen>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("state directory {dir} is in use by another rpk process{}", holder_suffix(.holder))]
    LockFailed {
        dir: PathBuf,
        holder: Option<u32>,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open job store: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

fn holder_suffix(holder: &Option<u32>) -> String {
    holder.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}

/// Exclusive lock on the state directory, held for the process lifetime.
pub struct StateLock {
    // NOTE(lifetime): the flock is released when this file is dropped
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Lock `<state_dir>/rpk.pid` and record our pid in it.
    pub fn acquire(state_dir: &Path) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join("rpk.pid");

        // Not truncated until the lock is held: the file names the holder
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        if let Err(source) = file.try_lock_exclusive() {
            let holder = std::fs::read_to_string(&path)
                .ok()
                .and_then(|pid| pid.trim().parse().ok());
            return Err(LifecycleError::LockFailed {
                dir: state_dir.to_owned(),
                holder,
                source,
            });
        }

        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        Ok(Self { file, path })
    }

    /// Remove the pid file, then drop the lock.
    pub fn release(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove pid file");
        }
        drop(self.file);
    }
}

/// Append the startup marker and install the file subscriber.
///
/// The returned guard flushes buffered log lines when dropped; keep it
/// alive until the process exits.
pub fn init_logging(
    state_dir: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(state_dir)?;
    write_startup_marker(&state_dir.join("rpk.log"))?;

    let file_appender = tracing_appender::rolling::never(state_dir, "rpk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

fn write_startup_marker(log_path: &Path) -> Result<(), LifecycleError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{})", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Everything a job-running command needs, started in order:
/// lock, store recovery, orphan reconciliation, checkpoint loop.
pub struct Runtime {
    supervisor: JobSupervisor,
    store: Arc<Store>,
    checkpoints: JoinHandle<()>,
    lock: StateLock,
}

impl Runtime {
    pub async fn start(config: &Config) -> Result<Self, LifecycleError> {
        let lock = StateLock::acquire(&config.state_dir)?;

        let paths = config.store_paths();
        let store = Arc::new(Store::open(&paths)?);

        let supervisor = Supervisor::new(
            SupervisorDeps {
                process: TracedProcess::new(CommandAdapter::new()),
                store: WalJobStore::new(Arc::clone(&store)),
                broadcaster: Broadcaster::new(),
                clock: SystemClock,
                ids: UuidIdGen,
            },
            config.runner_config(),
        );

        let orphans = supervisor.reconcile_orphans().await?;
        if orphans > 0 {
            warn!(orphans, "failed jobs interrupted by a previous run");
        }

        let checkpoints = tokio::spawn(checkpoint_loop(Arc::clone(&store)));
        info!(state_dir = %config.state_dir.display(), "runtime started");

        Ok(Self {
            supervisor,
            store,
            checkpoints,
            lock,
        })
    }

    pub fn supervisor(&self) -> &JobSupervisor {
        &self.supervisor
    }

    /// Wait for every runner, write a final checkpoint, release the lock.
    pub async fn shutdown(self) {
        self.supervisor.shutdown().await;
        self.checkpoints.abort();

        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || store.checkpoint()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "final checkpoint failed"),
            Err(e) => warn!(error = %e, "final checkpoint task failed"),
        }

        self.lock.release();
        info!("runtime stopped");
    }
}

async fn checkpoint_loop(store: Arc<Store>) {
    let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
    // The first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        let store = Arc::clone(&store);
        match tokio::task::spawn_blocking(move || store.checkpoint()).await {
            Ok(Ok(Some(result))) => {
                tracing::debug!(seq = result.seq, "periodic checkpoint");
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!(error = %e, "periodic checkpoint failed"),
            Err(e) => warn!(error = %e, "checkpoint task failed"),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
