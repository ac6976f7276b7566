// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered configuration: defaults, then `<state_dir>/config.toml`, then
//! `RPK_*` environment variables.

use rpk_core::mode::PACKAGE_EXTENSION;
use rpk_engine::{RunnerConfig, DEFAULT_MAX_CONCURRENT_JOBS};
use rpk_storage::StorePaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_EXECUTABLE: &str = "bash";
const DEFAULT_SCRIPT: &str = "plugin_repackaging.sh";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory (set RPK_STATE_DIR or HOME)")]
    NoStateDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// One configuration source. Unset keys fall through to the layer below.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layer {
    pub project_root: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub executable: Option<String>,
    pub script: Option<String>,
    pub artifact_extension: Option<String>,
    pub max_concurrent_jobs: Option<usize>,
}

impl Layer {
    /// Read a TOML layer; a missing file is an empty layer.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let max_concurrent_jobs = match crate::env::max_concurrent_jobs() {
            Some(value) => Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                var: "RPK_MAX_CONCURRENT_JOBS",
                value,
            })?),
            None => None,
        };
        Ok(Self {
            project_root: crate::env::project_root(),
            upload_dir: crate::env::upload_dir(),
            output_dir: crate::env::output_dir(),
            executable: crate::env::executable(),
            script: crate::env::script(),
            artifact_extension: None,
            max_concurrent_jobs,
        })
    }

    /// `self` with every unset key taken from `lower`.
    fn over(self, lower: Layer) -> Layer {
        Layer {
            project_root: self.project_root.or(lower.project_root),
            upload_dir: self.upload_dir.or(lower.upload_dir),
            output_dir: self.output_dir.or(lower.output_dir),
            executable: self.executable.or(lower.executable),
            script: self.script.or(lower.script),
            artifact_extension: self.artifact_extension.or(lower.artifact_extension),
            max_concurrent_jobs: self.max_concurrent_jobs.or(lower.max_concurrent_jobs),
        }
    }
}

/// Resolved configuration for one CLI invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub state_dir: PathBuf,
    pub project_root: PathBuf,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub executable: String,
    /// `None` runs the executable with the job arguments only
    pub script: Option<String>,
    pub artifact_extension: String,
    pub max_concurrent_jobs: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = crate::env::state_dir().ok_or(ConfigError::NoStateDir)?;
        let file = Layer::from_file(&state_dir.join("config.toml"))?;
        let env = Layer::from_env()?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self::resolve(state_dir, env.over(file), &cwd))
    }

    /// Apply defaults to a merged layer. Relative paths are taken from `cwd`.
    pub fn resolve(state_dir: PathBuf, layer: Layer, cwd: &Path) -> Self {
        let project_root = match layer.project_root {
            Some(root) => cwd.join(root),
            None => cwd.to_path_buf(),
        };
        let upload_dir = match layer.upload_dir {
            Some(dir) => project_root.join(dir),
            None => project_root.join("uploads"),
        };
        let output_dir = match layer.output_dir {
            Some(dir) => project_root.join(dir),
            None => project_root.join("outputs"),
        };
        let script = match layer.script {
            Some(script) if script.is_empty() => None,
            Some(script) => Some(script),
            None => Some(DEFAULT_SCRIPT.to_string()),
        };
        Self {
            state_dir,
            upload_dir,
            output_dir,
            project_root,
            executable: layer
                .executable
                .unwrap_or_else(|| DEFAULT_EXECUTABLE.to_string()),
            script,
            artifact_extension: layer
                .artifact_extension
                .unwrap_or_else(|| PACKAGE_EXTENSION.to_string()),
            max_concurrent_jobs: layer
                .max_concurrent_jobs
                .unwrap_or(DEFAULT_MAX_CONCURRENT_JOBS),
        }
    }

    pub fn store_paths(&self) -> StorePaths {
        StorePaths::in_dir(&self.state_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            executable: self.executable.clone(),
            script: self.script.clone(),
            project_root: self.project_root.clone(),
            upload_dir: self.upload_dir.clone(),
            output_dir: self.output_dir.clone(),
            artifact_extension: self.artifact_extension.clone(),
            log_dir: self.log_dir(),
            max_concurrent_jobs: self.max_concurrent_jobs,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
