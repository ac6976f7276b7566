// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{CommandSpec, ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let span = tracing::info_span!(
            "process.spawn",
            program = %spec.program,
            cwd = %spec.cwd.display()
        );
        async {
            tracing::info!(command = %spec.display(), "starting");
            let start = Instant::now();
            let result = self.inner.spawn(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "process started"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result.map(|handle| {
                Box::new(TracedHandle {
                    inner: handle,
                    program: spec.program.clone(),
                    lines: 0,
                    started: start,
                }) as Box<dyn ProcessHandle>
            })
        }
        .instrument(span)
        .await
    }
}

struct TracedHandle {
    inner: Box<dyn ProcessHandle>,
    program: String,
    lines: u64,
    started: Instant,
}

#[async_trait]
impl ProcessHandle for TracedHandle {
    async fn next_line(&mut self) -> Result<Option<String>, ProcessError> {
        let result = self.inner.next_line().await;
        match &result {
            Ok(Some(line)) => {
                self.lines += 1;
                tracing::trace!(program = %self.program, line_len = line.len(), "output line");
            }
            Ok(None) => {}
            Err(e) => tracing::error!(program = %self.program, error = %e, "read failed"),
        }
        result
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        let result = self.inner.wait().await;
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        tracing::info_span!("process.exit", program = %self.program).in_scope(|| match &result
        {
            Ok(code) => tracing::info!(exit_code = code, lines = self.lines, elapsed_ms, "exited"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "wait failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
