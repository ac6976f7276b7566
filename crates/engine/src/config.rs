// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration for job execution

use rpk_core::mode::PACKAGE_EXTENSION;
use std::path::PathBuf;

/// Default advisory cap on concurrently running jobs
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 5;

/// How jobs are executed. Built by the caller; the engine never reads the
/// environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Program to launch (e.g. `bash`)
    pub executable: String,
    /// Script passed as the first argument, if any
    pub script: Option<String>,
    /// Working directory of the tool and root of the artifact search
    pub project_root: PathBuf,
    /// Where uploaded LOCAL inputs live; excluded from the artifact search
    pub upload_dir: PathBuf,
    /// Where produced packages are moved
    pub output_dir: PathBuf,
    pub artifact_extension: String,
    /// Root of per-job activity logs
    pub log_dir: PathBuf,
    /// Advisory only: exceeding it is logged, never refused
    pub max_concurrent_jobs: usize,
}

impl RunnerConfig {
    /// Defaults laid out under `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            executable: "bash".to_string(),
            script: Some("plugin_repackaging.sh".to_string()),
            upload_dir: project_root.join("uploads"),
            output_dir: project_root.join("outputs"),
            project_root,
            artifact_extension: PACKAGE_EXTENSION.to_string(),
            log_dir: log_dir.into(),
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
        }
    }
}
