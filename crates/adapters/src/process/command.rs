// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real process adapter on top of `tokio::process`

use super::{CommandSpec, ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;
use std::io::{BufRead, BufReader, Read};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

type LineResult = Result<String, std::io::Error>;

/// Launches the external executable as a child process.
#[derive(Clone, Default)]
pub struct CommandAdapter;

impl CommandAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for CommandAdapter {
    async fn spawn(&self, spec: &CommandSpec) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let launch_error = |source: std::io::Error| ProcessError::Launch {
            program: spec.program.clone(),
            source,
        };

        // One pipe behind both stdout and stderr, so lines arrive in the
        // order the process wrote them.
        let (reader, writer) = std::io::pipe().map_err(launch_error)?;
        let stderr_writer = writer.try_clone().map_err(launch_error)?;

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(stderr_writer));
        let child = command.spawn().map_err(launch_error)?;
        // Our copies of the write end must close, or the reader never sees EOF
        drop(command);

        // A plain thread: a grandchild still holding the pipe must not keep
        // the runtime from shutting down.
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("rpk-output".to_string())
            .spawn(move || pump_lines(reader, tx))
            .map_err(launch_error)?;

        Ok(Box::new(CommandHandle { child, lines: rx }))
    }
}

/// Forward lines from the output pipe until EOF.
///
/// Keeps reading after the receiver is gone so the child is never blocked
/// writing into a full pipe.
fn pump_lines(pipe: impl Read, tx: mpsc::UnboundedSender<LineResult>) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return,
            Ok(_) => {
                let _ = tx.send(Ok(decode_line(&buf)));
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

/// Lossy UTF-8 decode with the line terminator removed.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

struct CommandHandle {
    child: Child,
    lines: mpsc::UnboundedReceiver<LineResult>,
}

#[async_trait]
impl ProcessHandle for CommandHandle {
    async fn next_line(&mut self) -> Result<Option<String>, ProcessError> {
        match self.lines.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(ProcessError::Read(e)),
            None => Ok(None),
        }
    }

    async fn wait(&mut self) -> Result<i32, ProcessError> {
        self.lines.close();
        let status = self.child.wait().await.map_err(ProcessError::Wait)?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
