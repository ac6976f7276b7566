// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CommandSpec, ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

/// One step of scripted process output
#[derive(Clone)]
pub enum FakeOutput {
    Line(String),
    /// Block the reader until the gate is notified
    Gate(Arc<Notify>),
    /// Fail the read with an I/O error
    ReadError(String),
}

/// What a fake process prints and how it ends.
#[derive(Clone, Default)]
pub struct FakeScript {
    outputs: Vec<FakeOutput>,
    exit_code: i32,
    /// Created (relative to the working directory) when the process exits
    artifact: Option<PathBuf>,
    launch_error: Option<String>,
}

impl FakeScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.outputs.push(FakeOutput::Line(line.into()));
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs
            .extend(lines.into_iter().map(|l| FakeOutput::Line(l.into())));
        self
    }

    pub fn gate(mut self, gate: Arc<Notify>) -> Self {
        self.outputs.push(FakeOutput::Gate(gate));
        self
    }

    pub fn read_error(mut self, message: impl Into<String>) -> Self {
        self.outputs.push(FakeOutput::ReadError(message.into()));
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn artifact(mut self, relative_path: impl Into<PathBuf>) -> Self {
        self.artifact = Some(relative_path.into());
        self
    }

    pub fn launch_error(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }
}

struct FakeProcessState {
    scripts: VecDeque<FakeScript>,
    default_script: FakeScript,
    calls: Vec<CommandSpec>,
}

/// Fake process adapter that plays back scripts in spawn order.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeProcessState>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProcessState {
                scripts: VecDeque::new(),
                default_script: FakeScript::default(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapter whose every spawn plays `script`.
    pub fn with_script(script: FakeScript) -> Self {
        let adapter = Self::default();
        adapter.inner.lock().default_script = script;
        adapter
    }

    /// Queue a script for the next spawn (FIFO, before the default).
    pub fn push_script(&self, script: FakeScript) {
        self.inner.lock().scripts.push_back(script);
    }

    /// Every spawn request seen so far
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let script = {
            let mut inner = self.inner.lock();
            inner.calls.push(spec.clone());
            match inner.scripts.pop_front() {
                Some(script) => script,
                None => inner.default_script.clone(),
            }
        };

        if let Some(message) = script.launch_error {
            return Err(ProcessError::Launch {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            });
        }

        Ok(Box::new(FakeHandle {
            outputs: script.outputs.into(),
            exit_code: script.exit_code,
            artifact: script.artifact.map(|rel| spec.cwd.join(rel)),
        }))
    }
}

struct FakeHandle {
    outputs: VecDeque<FakeOutput>,
    exit_code: i32,
    artifact: Option<PathBuf>,
}

#[async_trait]
impl ProcessHandle for FakeHandle {
    async fn next_line(&mut self) -> Result<Option<String>, ProcessError> {
        while let Some(output) = self.outputs.pop_front() {
            match output {
                FakeOutput::Line(line) => return Ok(Some(line)),
                FakeOutput::Gate(gate) => gate.notified().await,
                FakeOutput::ReadError(message) => {
                    return Err(ProcessError::Read(std::io::Error::other(message)))
                }
            }
        }
        Ok(None)
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        self.outputs.clear();
        if let Some(path) = self.artifact.take() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(ProcessError::Wait)?;
            }
            std::fs::write(&path, b"fake package").map_err(ProcessError::Wait)?;
        }
        Ok(self.exit_code)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
