// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier, record, and lifecycle state machine.

use crate::clock::Clock;
use crate::mode::{JobMode, Params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a submitted job.
    ///
    /// Assigned at submission time and never reused; keys the record store,
    /// the subscriber registry, and the per-job activity log.
    pub struct JobId;
}

/// Lifecycle status of a job.
///
/// `Pending` is the initial state. The three phase states may be revisited
/// in any order because they are inferred from free-form output.
/// `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Downloading,
    Extracting,
    Packaging,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Extracting => "extracting",
            JobStatus::Packaging => "packaging",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parse the lowercase form used in storage and on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "downloading" => JobStatus::Downloading,
            "extracting" => JobStatus::Extracting,
            "packaging" => JobStatus::Packaging,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => return None,
        })
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested change of a job's status, progress and step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub status: JobStatus,
    pub progress: f64,
    pub step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Full output transcript, attached when the job finishes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_text: Option<String>,
    pub epoch_ms: u64,
}

impl Transition {
    pub fn new(status: JobStatus, progress: f64, step: impl Into<String>, epoch_ms: u64) -> Self {
        Self {
            status,
            progress,
            step: step.into(),
            error: None,
            log_text: None,
            epoch_ms,
        }
    }

    /// A failure carrying `reason` as both the step text and the error message.
    pub fn failed(reason: impl Into<String>, epoch_ms: u64) -> Self {
        let reason = reason.into();
        Self {
            status: JobStatus::Failed,
            progress: 0.0,
            step: reason.clone(),
            error: Some(reason),
            log_text: None,
            epoch_ms,
        }
    }

    pub fn with_log_text(mut self, log_text: impl Into<String>) -> Self {
        self.log_text = Some(log_text.into());
        self
    }
}

/// Creation-time description of a job
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: String,
    pub name: String,
    pub mode: JobMode,
    pub params: Params,
    pub input_path: Option<PathBuf>,
    pub file_size: Option<u64>,
}

impl JobConfig {
    pub fn builder(id: impl Into<String>, mode: JobMode) -> JobConfigBuilder {
        JobConfigBuilder {
            config: JobConfig {
                id: id.into(),
                name: String::new(),
                mode,
                params: Params::new(),
                input_path: None,
                file_size: None,
            },
        }
    }
}

pub struct JobConfigBuilder {
    config: JobConfig,
}

impl JobConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.config.params = params;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.params.insert(key.into(), value.into());
        self
    }

    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.input_path = Some(path.into());
        self
    }

    pub fn file_size(mut self, size: u64) -> Self {
        self.config.file_size = Some(size);
        self
    }

    pub fn build(self) -> JobConfig {
        self.config
    }
}

/// Durable record of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub name: String,
    pub mode: JobMode,
    #[serde(default)]
    pub params: Params,
    pub status: JobStatus,
    pub progress: f64,
    pub current_step: String,
    #[serde(default)]
    pub input_path: Option<PathBuf>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub started_at_ms: Option<u64>,
    #[serde(default)]
    pub completed_at_ms: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub log_text: Option<String>,
}

impl JobRecord {
    pub fn new(config: JobConfig, clock: &impl Clock) -> Self {
        Self::new_with_epoch_ms(config, clock.epoch_ms())
    }

    pub fn new_with_epoch_ms(config: JobConfig, created_at_ms: u64) -> Self {
        Self {
            id: JobId::new(config.id),
            name: config.name,
            mode: config.mode,
            params: config.params,
            status: JobStatus::Pending,
            progress: 0.0,
            current_step: "queued".to_string(),
            input_path: config.input_path,
            output_path: None,
            file_size: config.file_size,
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            error: None,
            log_text: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `transition` would be accepted by [`JobRecord::apply_transition`].
    pub fn accepts(&self, transition: &Transition) -> bool {
        !self.is_terminal() && transition.status != JobStatus::Pending
    }

    /// Apply a transition, returning false (and changing nothing) if rejected.
    ///
    /// Terminal records are frozen. Progress never decreases, so a failure
    /// reported at 0.0 keeps the progress already reached. `started_at` is
    /// stamped by the first download phase, `completed_at` by the terminal
    /// transition, and neither is ever earlier than `created_at`.
    pub fn apply_transition(&mut self, transition: &Transition) -> bool {
        if !self.accepts(transition) {
            return false;
        }

        let at = transition.epoch_ms.max(self.created_at_ms);
        self.status = transition.status;
        self.progress = self.progress.max(transition.progress.clamp(0.0, 1.0));
        self.current_step = transition.step.clone();

        if transition.status == JobStatus::Downloading && self.started_at_ms.is_none() {
            self.started_at_ms = Some(at);
        }
        if transition.status.is_terminal() {
            let at = at.max(self.started_at_ms.unwrap_or(0));
            self.completed_at_ms.get_or_insert(at);
        }
        if transition.status == JobStatus::Failed {
            if let Some(error) = &transition.error {
                self.error = Some(error.clone());
            }
        }
        if let Some(log_text) = &transition.log_text {
            self.log_text = Some(log_text.clone());
        }
        true
    }

    /// Record the relocated artifact path. Set at most once, never after a terminal state.
    pub fn record_output(&mut self, path: PathBuf) -> bool {
        if self.is_terminal() || self.output_path.is_some() {
            return false;
        }
        self.output_path = Some(path);
        true
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
