// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job modes, their parameter keys, and display-name generation.

use crate::time_fmt::utc_from_epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, mode-specific submission parameters.
pub type Params = BTreeMap<String, String>;

/// File extension of packages produced (and consumed) by the repackaging tool.
pub const PACKAGE_EXTENSION: &str = ".difypkg";

/// Parameter keys understood by argument construction and naming.
pub mod param {
    pub const AUTHOR: &str = "author";
    pub const NAME: &str = "name";
    pub const VERSION: &str = "version";
    pub const REPO: &str = "repo";
    pub const RELEASE: &str = "release";
    pub const ASSET_NAME: &str = "asset_name";
    pub const FILE_NAME: &str = "file_name";
    pub const ORIGINAL_FILENAME: &str = "original_filename";
    pub const PLATFORM: &str = "platform";
    pub const SUFFIX: &str = "suffix";
}

/// Where the plugin package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    /// Fetched from the plugin marketplace by author/name/version
    Market,
    /// Fetched from a GitHub release asset
    Github,
    /// A previously uploaded package file
    Local,
}

impl JobMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobMode::Market => "market",
            JobMode::Github => "github",
            JobMode::Local => "local",
        }
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable job name derived from the submission.
///
/// Local jobs are named after the uploaded file. Remote jobs get the
/// package coordinates plus an `HHMMSS` creation stamp so repeated runs of
/// the same package stay distinguishable. Missing parameters fall back to
/// `<mode>_task_<HHMMSS>`.
pub fn job_name(mode: JobMode, params: &Params, created_at_ms: u64) -> String {
    let stamp = utc_from_epoch_ms(created_at_ms).format("%H%M%S").to_string();
    let get = |key: &str| {
        params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    };

    let named = match mode {
        JobMode::Local => get(param::ORIGINAL_FILENAME)
            .or_else(|| get(param::FILE_NAME))
            .map(|file| {
                file.strip_suffix(PACKAGE_EXTENSION)
                    .unwrap_or(file)
                    .to_string()
            }),
        JobMode::Market => match (get(param::AUTHOR), get(param::NAME), get(param::VERSION)) {
            (Some(author), Some(name), Some(version)) => {
                Some(format!("{author}/{name}@{version}_{stamp}"))
            }
            _ => None,
        },
        JobMode::Github => match (get(param::REPO), get(param::RELEASE)) {
            (Some(repo), Some(release)) => Some(format!("{repo}@{release}_{stamp}")),
            _ => None,
        },
    };

    named.unwrap_or_else(|| format!("{mode}_task_{stamp}"))
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;
