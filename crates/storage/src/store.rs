// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job record store: commit events durably, then expose the records.

use crate::checkpoint::{CheckpointError, CheckpointResult, Checkpointer};
use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::{JobFilter, MaterializedState};
use crate::wal::{Wal, WalError};
use parking_lot::Mutex;
use rpk_core::{Event, JobRecord};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// On-disk locations of the store
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
}

impl StorePaths {
    /// Standard layout under a state directory.
    pub fn in_dir(state_dir: &std::path::Path) -> Self {
        Self {
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
        }
    }
}

/// Outcome of [`Store::commit`]
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// The event is durable; carries the record as it now stands
    Applied(JobRecord),
    /// The event would change nothing (unknown job, reused id, or terminal
    /// record) and was not written
    Rejected,
}

impl Commit {
    pub fn applied(self) -> Option<JobRecord> {
        match self {
            Commit::Applied(record) => Some(record),
            Commit::Rejected => None,
        }
    }
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

/// Durable, shared job record store.
///
/// One lock covers check, append, fsync and apply, so each commit is atomic
/// with respect to every other commit and read.
pub struct Store {
    inner: Mutex<Inner>,
    checkpointer: Checkpointer,
}

impl Store {
    /// Load the snapshot (if any) and replay the WAL on top of it.
    pub fn open(paths: &StorePaths) -> Result<Self, StoreError> {
        let (mut state, snapshot_seq) = match Snapshot::load(&paths.snapshot_path)? {
            Some(snapshot) => {
                info!(
                    seq = snapshot.seq,
                    jobs = snapshot.state.jobs.len(),
                    "loaded snapshot"
                );
                (snapshot.state, snapshot.seq)
            }
            None => (MaterializedState::default(), 0),
        };

        let wal = Wal::open(&paths.wal_path, snapshot_seq)?;
        let replay = wal.entries_after(snapshot_seq)?;
        let replay_count = replay.len();
        for entry in replay {
            state.apply_event(&entry.event);
        }
        if replay_count > 0 {
            info!(
                replayed = replay_count,
                after_seq = snapshot_seq,
                "replayed events from WAL"
            );
        }

        Ok(Self {
            inner: Mutex::new(Inner { wal, state }),
            checkpointer: Checkpointer::new(paths.snapshot_path.clone()),
        })
    }

    /// Materialize the stored jobs without opening the store for writing.
    ///
    /// Safe to call while another process holds the store open. The log is
    /// read before the snapshot: a checkpoint writes its snapshot before
    /// truncating the log, so this order never loses an entry.
    pub fn read_state(paths: &StorePaths) -> Result<MaterializedState, StoreError> {
        let entries = Wal::read_entries(&paths.wal_path)?;
        let (mut state, snapshot_seq) = match Snapshot::read(&paths.snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };
        for entry in entries.iter().filter(|e| e.seq > snapshot_seq) {
            state.apply_event(&entry.event);
        }
        Ok(state)
    }

    /// Durably record `event` and apply it.
    ///
    /// Returns only after the WAL fsync, so a caller that publishes the
    /// returned record never announces a change that was not persisted.
    pub fn commit(&self, event: Event) -> Result<Commit, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.accepts(&event) {
            debug!(event = %event.log_summary(), "rejected event");
            return Ok(Commit::Rejected);
        }

        let seq = inner.wal.append(&event)?;
        inner.wal.flush()?;
        inner.state.apply_event(&event);
        debug!(seq, event = %event.log_summary(), "committed event");

        Ok(inner
            .state
            .jobs
            .get(event.job_id().as_str())
            .cloned()
            .map_or(Commit::Rejected, Commit::Applied))
    }

    /// Fetch a record by id or unique id prefix.
    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.inner.lock().state.get_job(id).cloned()
    }

    pub fn list(&self, filter: &JobFilter) -> Vec<JobRecord> {
        self.inner
            .lock()
            .state
            .list_jobs(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn non_terminal(&self) -> Vec<JobRecord> {
        self.inner
            .lock()
            .state
            .non_terminal_jobs()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Write a snapshot of the current state and drop the WAL prefix it covers.
    ///
    /// Returns `None` when nothing has been committed yet.
    pub fn checkpoint(&self) -> Result<Option<CheckpointResult>, StoreError> {
        let (state, seq) = {
            let inner = self.inner.lock();
            (inner.state.clone(), inner.wal.write_seq())
        };
        if seq == 0 {
            return Ok(None);
        }

        let result = self.checkpointer.checkpoint(seq, &state)?;
        self.inner.lock().wal.truncate_before(seq)?;
        debug!(seq, size_bytes = result.size_bytes, "checkpoint complete");
        Ok(Some(result))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
