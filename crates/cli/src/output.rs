// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use rpk_core::Clock;
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Relative age of a timestamp: `"5s"`, `"2m"`, `"1h"`, `"3d"`.
pub fn format_time_ago(epoch_ms: u64) -> String {
    time_ago(epoch_ms, rpk_core::SystemClock.epoch_ms())
}

fn time_ago(epoch_ms: u64, now_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    rpk_core::format_elapsed_ms(now_ms.saturating_sub(epoch_ms))
}

/// Progress fraction as a whole percentage.
pub fn format_progress(progress: f64) -> String {
    format!("{:.0}%", (progress * 100.0).clamp(0.0, 100.0))
}

/// Absolute UTC time for detail views.
pub fn format_timestamp(epoch_ms: u64) -> String {
    rpk_core::utc_from_epoch_ms(epoch_ms)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
