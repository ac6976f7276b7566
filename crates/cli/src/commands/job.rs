// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rpk list`, `rpk show`, `rpk logs` - Read-only job queries
//!
//! These read the store without taking the state lock, so they work while
//! `rpk run` is executing in another terminal.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use rpk_core::{format_elapsed_ms, JobId, JobMode, JobRecord, JobStatus};
use rpk_storage::{JobFilter, MaterializedState, Store};

use crate::color;
use crate::config::Config;
use crate::exit_error::ExitError;
use crate::output::{format_progress, format_time_ago, format_timestamp, print_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct ListArgs {
    /// Only jobs with this status (e.g. "failed", "completed")
    #[arg(long, value_parser = parse_status)]
    pub status: Option<JobStatus>,

    /// Maximum number of jobs to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Number of newest jobs to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Show all jobs (no limit)
    #[arg(long, conflicts_with = "limit")]
    pub no_limit: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Job ID or unique prefix
    pub id: String,

    /// Include the captured tool output
    #[arg(long)]
    pub transcript: bool,
}

#[derive(Args)]
pub struct LogsArgs {
    /// Job ID or unique prefix
    pub id: String,

    /// Number of most recent lines to show
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    JobStatus::parse(s).ok_or_else(|| {
        format!(
            "unknown status '{s}' (expected pending, downloading, extracting, packaging, \
             completed, failed or cancelled)"
        )
    })
}

/// One row of `rpk list -o json`
#[derive(Debug, Serialize)]
pub struct JobSummary<'a> {
    pub id: &'a JobId,
    pub name: &'a str,
    pub mode: JobMode,
    pub status: JobStatus,
    pub progress: f64,
    pub current_step: &'a str,
    pub created_at_ms: u64,
    pub output_path: Option<&'a PathBuf>,
    pub error: Option<&'a str>,
}

impl<'a> From<&'a JobRecord> for JobSummary<'a> {
    fn from(record: &'a JobRecord) -> Self {
        Self {
            id: &record.id,
            name: &record.name,
            mode: record.mode,
            status: record.status,
            progress: record.progress,
            current_step: &record.current_step,
            created_at_ms: record.created_at_ms,
            output_path: record.output_path.as_ref(),
            error: record.error.as_deref(),
        }
    }
}

fn load_state(config: &Config) -> Result<MaterializedState> {
    Store::read_state(&config.store_paths())
        .with_context(|| format!("failed to read job store in {}", config.state_dir.display()))
}

fn find_job(state: &MaterializedState, id: &str) -> Result<JobRecord> {
    state
        .get_job(id)
        .cloned()
        .ok_or_else(|| ExitError::new(1, format!("job not found: {id}")).into())
}

pub fn list(args: ListArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let state = load_state(config)?;
    let filter = JobFilter {
        status: args.status,
        offset: args.offset,
        limit: None,
    };
    let mut jobs = state.list_jobs(&filter);

    let total = jobs.len();
    let limit = if args.no_limit { total } else { args.limit };
    let truncated = total > limit;
    jobs.truncate(limit);

    match format {
        OutputFormat::Text => {
            format_job_list(&mut std::io::stdout(), &jobs);
            if truncated {
                println!(
                    "\n... {} more not shown. Use --no-limit or --limit N to see more.",
                    total - limit
                );
            }
        }
        OutputFormat::Json => {
            let rows: Vec<JobSummary<'_>> = jobs.into_iter().map(JobSummary::from).collect();
            print_json(&rows)?;
        }
    }
    Ok(())
}

pub(crate) fn format_job_list(out: &mut impl Write, jobs: &[&JobRecord]) {
    if jobs.is_empty() {
        let _ = writeln!(out, "No jobs");
        return;
    }

    let mut table = Table::new(vec![
        Column::muted("ID"),
        Column::left("NAME").with_max(40),
        Column::left("MODE"),
        Column::right("PROGRESS"),
        Column::left("CREATED"),
        Column::status("STATUS"),
    ]);
    for job in jobs {
        table.row(vec![
            short_id(&job.id),
            job.name.clone(),
            job.mode.to_string(),
            format_progress(job.progress),
            format_time_ago(job.created_at_ms),
            job.status.to_string(),
        ]);
    }
    table.render(out);
}

fn short_id(id: &JobId) -> String {
    id.as_str().chars().take(8).collect()
}

pub fn show(args: ShowArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let state = load_state(config)?;
    let job = find_job(&state, &args.id)?;

    match format {
        OutputFormat::Text => format_job_detail(&mut std::io::stdout(), &job, args.transcript),
        OutputFormat::Json => print_json(&job)?,
    }
    Ok(())
}

pub(crate) fn format_job_detail(out: &mut impl Write, job: &JobRecord, with_transcript: bool) {
    let label = |name: &str| color::context(&format!("{name}:"));

    let _ = writeln!(out, "{} {}", color::header("Job:"), job.id);
    let _ = writeln!(out, "  {} {}", label("Name"), job.name);
    let _ = writeln!(out, "  {} {}", label("Mode"), job.mode);
    let _ = writeln!(
        out,
        "  {} {} ({})",
        label("Status"),
        color::status(job.status.as_str()),
        format_progress(job.progress)
    );
    let _ = writeln!(out, "  {} {}", label("Step"), job.current_step);
    for (key, value) in &job.params {
        let _ = writeln!(out, "  {} {}", label(key), value);
    }
    if let Some(path) = &job.input_path {
        let _ = writeln!(out, "  {} {}", label("Input"), path.display());
    }
    if let Some(size) = job.file_size {
        let _ = writeln!(out, "  {} {} bytes", label("Size"), size);
    }
    if let Some(path) = &job.output_path {
        let _ = writeln!(out, "  {} {}", label("Output"), path.display());
    }
    let _ = writeln!(out, "  {} {}", label("Created"), format_timestamp(job.created_at_ms));
    if let Some(started) = job.started_at_ms {
        let _ = writeln!(out, "  {} {}", label("Started"), format_timestamp(started));
        if let Some(completed) = job.completed_at_ms {
            let _ = writeln!(
                out,
                "  {} {}",
                label("Duration"),
                format_elapsed_ms(completed.saturating_sub(started))
            );
        }
    }
    if let Some(error) = &job.error {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {} {}", label("Error"), error);
    }

    match (&job.log_text, with_transcript) {
        (Some(text), true) => {
            let _ = writeln!(out);
            let _ = writeln!(out, "  {}", color::header("Output:"));
            for line in text.lines() {
                let _ = writeln!(out, "    {line}");
            }
        }
        (Some(_), false) => {
            let _ = writeln!(out);
            let _ = writeln!(out, "  {}", color::muted("Use --transcript to see the tool output."));
        }
        (None, _) => {}
    }
}

pub fn logs(args: LogsArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let state = load_state(config)?;
    let job = find_job(&state, &args.id)?;
    let path = rpk_engine::log_paths::job_log_path(&config.log_dir(), job.id.as_str());
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    let lines = tail(&content, args.limit);

    match format {
        OutputFormat::Text => {
            if lines.is_empty() {
                eprintln!("No log entries found for job {}", job.id);
            }
            for line in lines {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            print_json(&serde_json::json!({
                "log_path": path.to_string_lossy(),
                "lines": lines,
            }))?;
        }
    }
    Ok(())
}

/// Last `limit` lines of `content`.
pub(crate) fn tail(content: &str, limit: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let skip = lines.len().saturating_sub(limit);
    lines[skip..].to_vec()
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
