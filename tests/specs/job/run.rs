//! `rpk run` specs
//!
//! Each run drives the scripted tool through a full job and checks the
//! exit code, the streamed output and what ends up on disk.

use crate::prelude::*;

#[test]
fn local_package_is_repackaged_into_outputs() {
    let project = Project::with_tool();
    let elsewhere = tempfile::tempdir().unwrap();
    let input = elsewhere.path().join("my-plugin.difypkg");
    std::fs::write(&input, "original").unwrap();

    let run = project
        .rpk()
        .args(&["run", "local", input.to_str().unwrap()])
        .passes()
        .stdout_has("submitted (my-plugin)")
        .stdout_has("  unziping")
        .stdout_has("extracting")
        .stdout_has("packaging")
        .stdout_has("completed   100%")
        .stdout_has("outputs/my-plugin-offline.difypkg");

    assert!(
        project.path().join("outputs/my-plugin-offline.difypkg").is_file(),
        "stdout: {}\nlog: {}",
        run.stdout(),
        project.log()
    );
    assert!(!project.path().join("work/my-plugin-offline.difypkg").exists());
    assert_eq!(
        std::fs::read_to_string(project.path().join("uploads/my-plugin.difypkg")).unwrap(),
        "original"
    );
}

#[test]
fn suffix_and_platform_reach_the_tool() {
    let project = Project::with_tool();
    project.file("uploads/p.difypkg", "original");

    project
        .rpk()
        .args(&["run", "local", "p.difypkg", "-s", "bundle", "-p", "manylinux2014_x86_64"])
        .passes()
        .stdout_has("  platform manylinux2014_x86_64")
        .stdout_has("outputs/p-bundle.difypkg");
}

#[test]
fn error_line_fails_the_job_with_exit_1() {
    let project = Project::with_tool();

    project
        .rpk()
        .args(&["run", "market", "langgenius", "openai", "0.0.1"])
        .exits(1)
        .stdout_has("submitted (langgenius/openai@0.0.1_")
        .stdout_has("failed")
        .stderr_has("failed: error: plugin langgenius/openai not found");
}

#[test]
fn clean_exit_without_package_still_completes() {
    let project = Project::with_tool();

    project
        .rpk()
        .args(&["run", "github", "owner/repo", "v1.0.0", "tool.difypkg"])
        .passes()
        .stdout_has("completed (no package was produced)");
}

#[test]
fn missing_local_input_fails_the_job() {
    let project = Project::with_tool();

    project
        .rpk()
        .args(&["run", "local", "ghost.difypkg"])
        .exits(1)
        .stderr_has("input file not found");
}

#[test]
fn missing_tool_fails_the_job() {
    let project = Project::empty();
    project.file("uploads/p.difypkg", "original");

    project
        .rpk()
        .env("RPK_EXECUTABLE", "/nonexistent/rpk-tool")
        .env("RPK_SCRIPT", "")
        .args(&["run", "local", "p.difypkg"])
        .exits(1)
        .stderr_has("/nonexistent/rpk-tool");
}

#[test]
fn json_output_streams_wire_messages() {
    let project = Project::with_tool();
    project.file("uploads/p.difypkg", "original");

    let run = project
        .rpk()
        .args(&["run", "local", "p.difypkg", "-o", "json"])
        .passes();

    let messages: Vec<serde_json::Value> = run
        .stdout()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(messages.iter().any(|m| m["type"] == "log"));
    let last = messages.last().unwrap();
    assert_eq!(last["type"], "progress");
    assert_eq!(last["data"]["status"], "completed");
    assert_eq!(last["data"]["progress"], 1.0);
}
