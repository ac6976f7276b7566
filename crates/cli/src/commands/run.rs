// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rpk run` - Submit a repackaging job and follow it to the end

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use rpk_core::mode::{param, Params};
use rpk_core::{JobMessage, JobMode, JobRecord, JobStatus};
use rpk_engine::{JobRequest, JobStore};

use crate::color;
use crate::exit_error::{ExitError, EXIT_CANCELLED, EXIT_FAILED};
use crate::lifecycle::Runtime;
use crate::output::{format_progress, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub source: Source,
}

/// Where the package to repackage comes from
#[derive(Subcommand)]
pub enum Source {
    /// Download a plugin from the marketplace
    Market {
        author: String,
        name: String,
        version: String,
        #[command(flatten)]
        target: Target,
    },
    /// Download a plugin from a GitHub release asset
    Github {
        /// Repository, as `owner/name` or a full URL
        repo: String,
        release: String,
        asset_name: String,
        #[command(flatten)]
        target: Target,
    },
    /// Repackage a package file, copied into the upload directory first
    Local {
        file: PathBuf,
        /// Name to report instead of the file's own name
        #[arg(long)]
        original_filename: Option<String>,
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
pub struct Target {
    /// Target platform passed to the tool (e.g. manylinux2014_x86_64)
    #[arg(short = 'p', long)]
    pub platform: Option<String>,
    /// Suffix of the produced package
    #[arg(short = 's', long, default_value = rpk_engine::DEFAULT_SUFFIX)]
    pub suffix: String,
}

impl Target {
    fn apply(self, params: &mut Params) {
        if let Some(platform) = self.platform {
            params.insert(param::PLATFORM.to_string(), platform);
        }
        params.insert(param::SUFFIX.to_string(), self.suffix);
    }
}

impl Source {
    /// Build the job request. A local package outside `upload_dir` is
    /// copied in; a name that resolves nowhere is submitted as is and the
    /// job fails on the missing input.
    pub fn into_request(self, upload_dir: &Path) -> Result<JobRequest> {
        let mut params = Params::new();
        let (mode, target, file_size) = match self {
            Source::Market {
                author,
                name,
                version,
                target,
            } => {
                params.insert(param::AUTHOR.to_string(), author);
                params.insert(param::NAME.to_string(), name);
                params.insert(param::VERSION.to_string(), version);
                (JobMode::Market, target, None)
            }
            Source::Github {
                repo,
                release,
                asset_name,
                target,
            } => {
                params.insert(param::REPO.to_string(), repo);
                params.insert(param::RELEASE.to_string(), release);
                params.insert(param::ASSET_NAME.to_string(), asset_name);
                (JobMode::Github, target, None)
            }
            Source::Local {
                file,
                original_filename,
                target,
            } => {
                let (file_name, size) = stage_upload(&file, upload_dir)?;
                params.insert(
                    param::ORIGINAL_FILENAME.to_string(),
                    original_filename.unwrap_or_else(|| file_name.clone()),
                );
                params.insert(param::FILE_NAME.to_string(), file_name);
                (JobMode::Local, target, size)
            }
        };
        target.apply(&mut params);
        Ok(JobRequest {
            mode,
            params,
            file_size,
        })
    }
}

/// Put `file` into `upload_dir` under its own name, returning that name
/// and the staged size.
fn stage_upload(file: &Path, upload_dir: &Path) -> Result<(String, Option<u64>)> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid package path: {}", file.display()))?
        .to_string();
    let staged = upload_dir.join(&name);

    if file.is_file() && !is_same_file(file, &staged) {
        std::fs::create_dir_all(upload_dir)?;
        std::fs::copy(file, &staged).with_context(|| {
            format!("failed to copy {} to {}", file.display(), staged.display())
        })?;
    }

    let size = std::fs::metadata(&staged).ok().map(|m| m.len());
    Ok((name, size))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub async fn handle(
    args: RunArgs,
    runtime: &Runtime,
    upload_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let request = args.source.into_request(upload_dir)?;
    let supervisor = runtime.supervisor();
    let (id, mut subscription) = supervisor.submit_and_subscribe(request).await?;
    if format == OutputFormat::Text {
        if let Some(record) = supervisor.store().get(id.as_str()) {
            println!("Job {} submitted ({})", id, record.name);
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancel_requested = false;

    loop {
        tokio::select! {
            message = subscription.recv() => {
                let Some(message) = message else { break };
                match format {
                    OutputFormat::Text => println!("{}", render_message(&message)),
                    OutputFormat::Json => println!("{}", serde_json::to_string(&message)?),
                }
                if message.status().is_some_and(|s| s.is_terminal()) {
                    break;
                }
            }
            _ = &mut ctrl_c, if !cancel_requested => {
                cancel_requested = true;
                supervisor.announce(format!(
                    "interrupted: cancelling job {id}, the tool keeps running until it exits"
                ));
                supervisor.cancel(id.as_str()).await?;
            }
        }
    }
    subscription.close();

    let record = supervisor
        .store()
        .get(id.as_str())
        .with_context(|| format!("job {id} disappeared from the store"))?;
    if format == OutputFormat::Text && record.status == JobStatus::Completed {
        println!("{}", completion_summary(&record));
    }
    outcome(&record)?;
    Ok(())
}

/// One line of live text output.
pub(crate) fn render_message(message: &JobMessage) -> String {
    match message {
        JobMessage::Log(event) => format!("  {}", event.log),
        JobMessage::Progress(event) => {
            let detail = if event.status == JobStatus::Failed {
                &event.message
            } else {
                &event.current_step
            };
            format!(
                "{} {:>4} {}",
                color::status(&format!("{:<11}", event.status.as_str())),
                format_progress(event.progress),
                color::muted(detail)
            )
        }
        JobMessage::System(event) => format!("{} {}", color::header("system:"), event.message),
    }
}

pub(crate) fn completion_summary(record: &JobRecord) -> String {
    match &record.output_path {
        Some(path) => format!("Job {} completed: {}", record.id, path.display()),
        None => format!("Job {} completed (no package was produced)", record.id),
    }
}

/// Map the final record to the process exit status.
pub(crate) fn outcome(record: &JobRecord) -> Result<(), ExitError> {
    match record.status {
        JobStatus::Failed => Err(ExitError::new(
            EXIT_FAILED,
            format!(
                "job {} failed: {}",
                record.id,
                record.error.as_deref().unwrap_or("unknown error")
            ),
        )),
        JobStatus::Cancelled => Err(ExitError::new(
            EXIT_CANCELLED,
            format!("job {} cancelled", record.id),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
