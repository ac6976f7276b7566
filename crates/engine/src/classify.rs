// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase inference from free-form process output.
//!
//! The external tool has no structured progress protocol, so phases are
//! guessed from keywords. Every line is valid input; most carry no signal.

use rpk_core::JobStatus;

/// The phase a line points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: JobStatus,
    pub progress: f64,
    /// Step text for the record, prefixed with the phase label
    pub step: String,
    /// The line as received
    pub message: String,
}

impl Classification {
    /// A failure line ends output processing for the job.
    pub fn stops_output(&self) -> bool {
        self.status == JobStatus::Failed
    }
}

struct Rule {
    keywords: &'static [&'static str],
    status: JobStatus,
    progress: f64,
    label: &'static str,
}

/// Highest precedence first.
const RULES: &[Rule] = &[
    Rule {
        keywords: &["error", "failed"],
        status: JobStatus::Failed,
        progress: 0.0,
        label: "error",
    },
    Rule {
        keywords: &["success", "complete"],
        status: JobStatus::Packaging,
        progress: 0.9,
        label: "finishing",
    },
    Rule {
        keywords: &["repackaging", "package", "building"],
        status: JobStatus::Packaging,
        progress: 0.7,
        label: "repackaging",
    },
    Rule {
        keywords: &["unziping", "unzip", "extract"],
        status: JobStatus::Extracting,
        progress: 0.5,
        label: "extracting",
    },
    Rule {
        keywords: &["downloading", "download"],
        status: JobStatus::Downloading,
        progress: 0.3,
        label: "downloading",
    },
];

/// Map one output line to the phase it signals, if any.
///
/// Matching is case-insensitive and by substring. When a line matches
/// several rules the first rule in precedence order wins, so
/// `"download complete"` is a packaging signal, not a download one.
pub fn classify(line: &str) -> Option<Classification> {
    let lower = line.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| Classification {
            status: rule.status,
            progress: rule.progress,
            step: format!("{}: {}", rule.label, line),
            message: line.to_string(),
        })
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
