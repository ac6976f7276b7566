// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External process adapters

mod command;

pub use command::CommandAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOutput, FakeProcessAdapter, FakeScript};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read process output: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// What to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Adapter for launching the external process
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Start the process with stdout and stderr captured as one line stream.
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>, ProcessError>;
}

/// A running process.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Next line of combined output without its line terminator, or `None`
    /// once both streams are closed. Invalid UTF-8 is replaced, never an error.
    async fn next_line(&mut self) -> Result<Option<String>, ProcessError>;

    /// Wait for exit and return the exit code (`-1` if killed by a signal).
    ///
    /// Output not yet read is discarded, but the pipes keep draining so the
    /// process never stalls on a full buffer.
    async fn wait(&mut self) -> Result<i32, ProcessError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
