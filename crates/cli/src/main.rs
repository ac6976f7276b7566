// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rpk - Dify plugin repackaging orchestrator

mod color;
mod commands;
mod config;
mod env;
mod exit_error;
mod lifecycle;
mod output;
mod table;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{job, run};
use config::Config;
use lifecycle::Runtime;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "rpk",
    version,
    about = "Repackage Dify plugins into offline installable packages"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Repackage a plugin and follow the job until it finishes
    Run(run::RunArgs),
    /// List jobs, newest first
    List(job::ListArgs),
    /// Show details of a job
    Show(job::ShowArgs),
    /// Show the activity log of a job
    Logs(job::LogsArgs),
}

fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// When the top-level message already contains every source message (the
/// usual result of `#[error("... {0}")]` with `#[from]`), the chain is
/// skipped. Otherwise it is rendered in full.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load()?;
    match command {
        Commands::Run(args) => {
            let _log_guard = lifecycle::init_logging(&config.state_dir)?;
            let runtime = Runtime::start(&config).await?;
            let result = run::handle(args, &runtime, &config.upload_dir, format).await;
            runtime.shutdown().await;
            result?;
        }
        Commands::List(args) => job::list(args, &config, format)?,
        Commands::Show(args) => job::show(args, &config, format)?,
        Commands::Logs(args) => job::logs(args, &config, format)?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
