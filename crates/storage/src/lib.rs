// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable job record store: write-ahead log, snapshots, materialized state

mod checkpoint;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{CheckpointError, CheckpointResult, CheckpointWriter, Checkpointer, FsCheckpointWriter};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::{JobFilter, MaterializedState};
pub use store::{Commit, Store, StoreError, StorePaths};
pub use wal::{Wal, WalEntry, WalError};
