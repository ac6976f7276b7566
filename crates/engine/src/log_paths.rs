// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path builders for per-job log files.
//!
//! Shared by the logger (writer) and the CLI (reader):
//!   `<logs_dir>/job/<job_id>.log`

use std::path::{Path, PathBuf};

/// Build the path to a job log file.
///
/// Structure: `{logs_dir}/job/{job_id}.log`
pub fn job_log_path(logs_dir: &Path, job_id: &str) -> PathBuf {
    logs_dir.join("job").join(format!("{}.log", job_id))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
