// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line construction for the repackaging tool.
//!
//! Convention: `[script] [-p <platform>] [-s <suffix>] <mode> <positional...>`.
//! The suffix flag is omitted for the tool's default suffix, `offline`.

use crate::error::RunError;
use rpk_core::mode::{param, Params};
use rpk_core::JobMode;
use std::path::Path;

/// Suffix the tool applies when `-s` is not given
pub const DEFAULT_SUFFIX: &str = "offline";

/// Tool arguments for a job, after the optional script path.
///
/// LOCAL jobs reference `<upload_dir>/<file_name>`, which must exist.
pub fn build_args(mode: JobMode, params: &Params, upload_dir: &Path) -> Result<Vec<String>, RunError> {
    let mut args = Vec::new();

    if let Some(platform) = optional(params, param::PLATFORM) {
        args.push("-p".to_string());
        args.push(platform.to_string());
    }
    if let Some(suffix) = optional(params, param::SUFFIX) {
        if suffix != DEFAULT_SUFFIX {
            args.push("-s".to_string());
            args.push(suffix.to_string());
        }
    }

    args.push(mode.as_str().to_string());
    match mode {
        JobMode::Market => {
            for key in [param::AUTHOR, param::NAME, param::VERSION] {
                args.push(required(params, mode, key)?.to_string());
            }
        }
        JobMode::Github => {
            for key in [param::REPO, param::RELEASE, param::ASSET_NAME] {
                args.push(required(params, mode, key)?.to_string());
            }
        }
        JobMode::Local => {
            let file_name = required(params, mode, param::FILE_NAME)?;
            let path = upload_dir.join(file_name);
            if !path.is_file() {
                return Err(RunError::InputMissing(path));
            }
            args.push(path.display().to_string());
        }
    }
    Ok(args)
}

fn optional<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn required<'a>(params: &'a Params, mode: JobMode, key: &'static str) -> Result<&'a str, RunError> {
    optional(params, key).ok_or(RunError::MissingParam { mode, key })
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
