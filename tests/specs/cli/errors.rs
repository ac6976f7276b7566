//! CLI error handling specs

use crate::prelude::*;

#[test]
fn show_unknown_job_fails() {
    let project = Project::empty();
    project
        .rpk()
        .args(&["show", "nope"])
        .exits(1)
        .stderr_has("Error: job not found: nope");
}

#[test]
fn unknown_status_filter_is_rejected() {
    let project = Project::empty();
    project
        .rpk()
        .args(&["list", "--status", "running"])
        .fails()
        .stderr_has("unknown status 'running'");
}

#[test]
fn market_run_needs_version() {
    let project = Project::with_tool();
    project
        .rpk()
        .args(&["run", "market", "langgenius", "openai"])
        .fails()
        .stderr_has("<VERSION>");
}

#[test]
fn malformed_config_file_is_reported() {
    let project = Project::empty();
    std::fs::write(project.state_path().join("config.toml"), "max_jobs = 3\n").unwrap();
    project
        .rpk()
        .args(&["list"])
        .fails()
        .stderr_has("invalid config file");
}
