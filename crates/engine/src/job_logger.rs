// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only logger for per-job activity logs.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rpk_core::utc_from_epoch_ms;

use crate::log_paths;

/// Append-only logger for per-job activity logs.
///
/// Writes human-readable timestamped lines to:
///   `<log_dir>/job/<job_id>.log`
///
/// Each `append()` opens, writes, and closes the file on the blocking pool
/// and resolves once the line is written, so a job's lines keep their order.
#[derive(Clone)]
pub struct JobLogger {
    log_dir: PathBuf,
}

impl JobLogger {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }

    pub fn path_for(&self, job_id: &str) -> PathBuf {
        log_paths::job_log_path(&self.log_dir, job_id)
    }

    /// Append a log line for the given job.
    ///
    /// Format: `2026-01-30T08:14:09Z [step] message`
    ///
    /// Failures are logged via tracing and never propagate.
    pub async fn append(&self, job_id: &str, epoch_ms: u64, step: &str, message: &str) {
        let path = self.path_for(job_id);
        let line = format!(
            "{} [{}] {}\n",
            utc_from_epoch_ms(epoch_ms).format("%Y-%m-%dT%H:%M:%SZ"),
            step,
            message
        );
        let written = tokio::task::spawn_blocking(move || write_line(&path, &line)).await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(job_id, error = %e, "failed to write job log"),
            Err(e) => tracing::warn!(job_id, error = %e, "job log write did not finish"),
        }
    }
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

#[cfg(test)]
#[path = "job_logger_tests.rs"]
mod tests;
