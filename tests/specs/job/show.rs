//! `rpk list`, `rpk show` and `rpk logs` specs

use crate::prelude::*;

fn run_one_local(project: &Project) -> String {
    project.file("uploads/p.difypkg", "original");
    project
        .rpk()
        .args(&["run", "local", "p.difypkg"])
        .passes();
    let list = project.rpk().args(&["list", "-o", "json"]).passes().json();
    list[0]["id"].as_str().unwrap().to_string()
}

#[test]
fn empty_store_lists_no_jobs() {
    let project = Project::empty();
    project.rpk().args(&["list"]).passes().stdout_eq("No jobs\n");
}

#[test]
fn list_shows_finished_jobs_newest_first() {
    let project = Project::with_tool();
    run_one_local(&project);
    project
        .rpk()
        .args(&["run", "market", "langgenius", "openai", "0.0.1"])
        .exits(1);

    let list = project.rpk().args(&["list", "-o", "json"]).passes().json();
    let jobs = list.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["mode"], "market");
    assert_eq!(jobs[0]["status"], "failed");
    assert_eq!(jobs[1]["name"], "p");
    assert_eq!(jobs[1]["status"], "completed");

    project
        .rpk()
        .args(&["list", "--status", "failed"])
        .passes()
        .stdout_has("market")
        .stdout_lacks("local");
}

#[test]
fn show_json_has_the_full_record() {
    let project = Project::with_tool();
    let id = run_one_local(&project);

    let record = project
        .rpk()
        .args(&["show", &id[..8], "-o", "json"])
        .passes()
        .json();
    assert_eq!(record["id"], id.as_str());
    assert_eq!(record["status"], "completed");
    assert_eq!(record["progress"], 1.0);
    assert!(record["output_path"]
        .as_str()
        .unwrap()
        .ends_with("outputs/p-offline.difypkg"));
    assert!(record["log_text"].as_str().unwrap().contains("repackaging p"));
    assert!(record["completed_at_ms"].is_u64());
}

#[test]
fn show_text_with_transcript() {
    let project = Project::with_tool();
    let id = run_one_local(&project);

    project
        .rpk()
        .args(&["show", &id, "--transcript"])
        .passes()
        .stdout_has(&format!("Job: {id}"))
        .stdout_has("Status: completed (100%)")
        .stdout_has("    repackaging p");
}

#[test]
fn logs_show_the_activity_log() {
    let project = Project::with_tool();
    let id = run_one_local(&project);

    project
        .rpk()
        .args(&["logs", &id])
        .passes()
        .stdout_has("[spawn] bash plugin_repackaging.sh local")
        .stdout_has("[output] unziping")
        .stdout_has("[completed]");
}

#[test]
fn interrupted_jobs_are_failed_on_next_run() {
    let project = Project::with_tool();
    let wal_dir = project.state_path().join("wal");
    std::fs::create_dir_all(&wal_dir).unwrap();
    std::fs::write(
        wal_dir.join("events.wal"),
        concat!(
            r#"{"seq":1,"event":{"type":"job:created","id":"orphan-1","name":"p","mode":"local","#,
            r#""params":{"file_name":"p.difypkg"},"input_path":null,"file_size":null,"#,
            r#""created_at_epoch_ms":1000}}"#,
            "\n"
        ),
    )
    .unwrap();

    run_one_local(&project);

    let orphan = project
        .rpk()
        .args(&["show", "orphan-1", "-o", "json"])
        .passes()
        .json();
    assert_eq!(orphan["status"], "failed");
    assert_eq!(orphan["error"], "interrupted: orchestrator restarted");
}
