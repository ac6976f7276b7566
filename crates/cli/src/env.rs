// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

// --- State directory ---

/// Resolve state directory: RPK_STATE_DIR > XDG_STATE_HOME/rpk > ~/.local/state/rpk
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty("RPK_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("rpk"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/rpk"))
}

// --- Job execution overrides ---

pub fn project_root() -> Option<PathBuf> {
    non_empty("RPK_PROJECT_ROOT").map(PathBuf::from)
}

pub fn upload_dir() -> Option<PathBuf> {
    non_empty("RPK_UPLOAD_DIR").map(PathBuf::from)
}

pub fn output_dir() -> Option<PathBuf> {
    non_empty("RPK_OUTPUT_DIR").map(PathBuf::from)
}

pub fn executable() -> Option<String> {
    non_empty("RPK_EXECUTABLE")
}

/// `RPK_SCRIPT`, kept even when empty: an empty value disables the script.
pub fn script() -> Option<String> {
    std::env::var("RPK_SCRIPT").ok()
}

pub fn max_concurrent_jobs() -> Option<String> {
    non_empty("RPK_MAX_CONCURRENT_JOBS")
}

// --- Color ---

pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}
