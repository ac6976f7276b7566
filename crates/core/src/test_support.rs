// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::mode::{param, Params};
use crate::{Event, JobConfig, JobId, JobMode, JobStatus, Transition};
use std::path::PathBuf;

// ── Parameter builders ──────────────────────────────────────────────────────

pub fn local_params(file_name: &str) -> Params {
    Params::from([(param::FILE_NAME.to_string(), file_name.to_string())])
}

pub fn market_params(author: &str, name: &str, version: &str) -> Params {
    Params::from([
        (param::AUTHOR.to_string(), author.to_string()),
        (param::NAME.to_string(), name.to_string()),
        (param::VERSION.to_string(), version.to_string()),
    ])
}

pub fn local_config(id: &str) -> JobConfig {
    JobConfig::builder(id, JobMode::Local)
        .name("test-plugin")
        .params(local_params("test-plugin.difypkg"))
        .input_path("/test/uploads/test-plugin.difypkg")
        .build()
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn job_created_event(id: &str) -> Event {
    job_created_at(id, 1_000_000)
}

pub fn job_created_at(id: &str, created_at_epoch_ms: u64) -> Event {
    Event::JobCreated {
        id: JobId::new(id),
        name: "test-plugin".to_string(),
        mode: JobMode::Local,
        params: local_params("test-plugin.difypkg"),
        input_path: Some(PathBuf::from("/test/uploads/test-plugin.difypkg")),
        file_size: Some(2048),
        created_at_epoch_ms,
    }
}

pub fn transition_event(id: &str, status: JobStatus, progress: f64) -> Event {
    Event::JobTransitioned {
        id: JobId::new(id),
        transition: Transition::new(status, progress, status.as_str(), 1_000_500),
    }
}

pub fn failed_event(id: &str, error: &str) -> Event {
    Event::JobTransitioned {
        id: JobId::new(id),
        transition: Transition::failed(error, 1_000_600),
    }
}

pub fn output_event(id: &str, path: &str) -> Event {
    Event::JobOutputRecorded {
        id: JobId::new(id),
        path: PathBuf::from(path),
    }
}
