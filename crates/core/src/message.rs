// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient messages fanned out to live job subscribers.
//!
//! Wire shape: `{"type": "progress" | "log" | "system", "data": {...}}`
//! with RFC 3339 UTC timestamps.

use crate::job::{JobId, JobRecord, JobStatus};
use crate::time_fmt::utc_from_epoch_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed transition, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: f64,
    pub current_step: String,
    /// Error message for failures, otherwise the step text
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Build from a record that was just committed.
    pub fn from_record(record: &JobRecord, epoch_ms: u64) -> Self {
        let message = match (&record.status, &record.error) {
            (JobStatus::Failed, Some(error)) => error.clone(),
            _ => record.current_step.clone(),
        };
        Self {
            job_id: record.id.clone(),
            status: record.status,
            progress: record.progress,
            current_step: record.current_step.clone(),
            message,
            timestamp: utc_from_epoch_ms(epoch_ms),
        }
    }
}

/// One raw output line from the external process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub job_id: JobId,
    pub log: String,
    pub timestamp: DateTime<Utc>,
}

/// Operator notice sent to every subscriber of every job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum JobMessage {
    Progress(ProgressEvent),
    Log(LogEvent),
    System(SystemEvent),
}

impl JobMessage {
    pub fn log(job_id: &JobId, line: impl Into<String>, epoch_ms: u64) -> Self {
        JobMessage::Log(LogEvent {
            job_id: job_id.clone(),
            log: line.into(),
            timestamp: utc_from_epoch_ms(epoch_ms),
        })
    }

    pub fn system(message: impl Into<String>, epoch_ms: u64) -> Self {
        JobMessage::System(SystemEvent {
            message: message.into(),
            timestamp: utc_from_epoch_ms(epoch_ms),
        })
    }

    /// Status carried by a progress message, if any.
    pub fn status(&self) -> Option<JobStatus> {
        match self {
            JobMessage::Progress(p) => Some(p.status),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
