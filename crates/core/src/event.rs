// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable job events written to the write-ahead log

use crate::job::{JobId, Transition};
use crate::mode::{JobMode, Params};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Facts about a job, in the order they were committed.
///
/// Serializes with `{"type": "job:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "job:created")]
    JobCreated {
        id: JobId,
        name: String,
        mode: JobMode,
        #[serde(default)]
        params: Params,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_size: Option<u64>,
        created_at_epoch_ms: u64,
    },

    #[serde(rename = "job:transitioned")]
    JobTransitioned { id: JobId, transition: Transition },

    #[serde(rename = "job:output_recorded")]
    JobOutputRecorded { id: JobId, path: PathBuf },
}

impl Event {
    pub fn job_id(&self) -> &JobId {
        match self {
            Event::JobCreated { id, .. }
            | Event::JobTransitioned { id, .. }
            | Event::JobOutputRecorded { id, .. } => id,
        }
    }

    /// One-line description for logs.
    pub fn log_summary(&self) -> String {
        match self {
            Event::JobCreated { id, mode, name, .. } => {
                format!("job:created id={id} mode={mode} name={name}")
            }
            Event::JobTransitioned { id, transition } => format!(
                "job:transitioned id={id} status={} progress={:.2}",
                transition.status, transition.progress
            ),
            Event::JobOutputRecorded { id, path } => {
                format!("job:output_recorded id={id} path={}", path.display())
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
