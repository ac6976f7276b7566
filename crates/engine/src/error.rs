// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the job engine

use rpk_adapters::ProcessError;
use rpk_core::JobMode;
use rpk_storage::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Faults inside one job's run.
///
/// Never escapes the runner: each one becomes the job's FAILED transition,
/// with `to_string()` as the error message.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{mode} job is missing parameter '{key}'")]
    MissingParam { mode: JobMode, key: &'static str },
    #[error("input file not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to relocate artifact {}: {source}", path.display())]
    Relocate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artifact collection did not finish: {0}")]
    Collect(#[from] tokio::task::JoinError),
}

/// Errors surfaced to whoever drives the supervisor
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("job {0} was not created (id already in use)")]
    DuplicateJob(String),
}
