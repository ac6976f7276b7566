// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::broadcast::Subscription;
use crate::store::{MemoryJobStore, WalJobStore};
use parking_lot::Mutex;
use rpk_adapters::{FakeProcessAdapter, FakeScript};
use rpk_core::test_support::local_params;
use rpk_core::{FakeClock, JobMode};
use std::path::PathBuf;
use tempfile::TempDir;

const ARTIFACT: &str = "build/test-plugin-offline.difypkg";

struct Harness<S> {
    _dir: TempDir,
    root: PathBuf,
    process: FakeProcessAdapter,
    store: S,
    broadcaster: Broadcaster,
    runner: JobRunner<FakeProcessAdapter, S, FakeClock>,
}

fn config_in(dir: &TempDir) -> RunnerConfig {
    let root = dir.path().join("project");
    std::fs::create_dir_all(root.join("uploads")).unwrap();
    std::fs::write(root.join("uploads/test-plugin.difypkg"), b"input").unwrap();
    RunnerConfig::new(root, dir.path().join("logs"))
}

fn harness_with<S: JobStore>(script: FakeScript, store: S, dir: TempDir, config: RunnerConfig) -> Harness<S> {
    let process = FakeProcessAdapter::with_script(script);
    let broadcaster = Broadcaster::new();
    let root = config.project_root.clone();
    let runner = JobRunner::new(
        process.clone(),
        store.clone(),
        broadcaster.clone(),
        FakeClock::new(),
        Arc::new(config),
    );
    Harness {
        _dir: dir,
        root,
        process,
        store,
        broadcaster,
        runner,
    }
}

fn harness(script: FakeScript) -> Harness<MemoryJobStore> {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    harness_with(script, MemoryJobStore::new(), dir, config)
}

impl<S: JobStore> Harness<S> {
    async fn create(&self, id: &str) -> JobRecord {
        self.store
            .commit(Event::JobCreated {
                id: JobId::new(id),
                name: "test-plugin".to_string(),
                mode: JobMode::Local,
                params: local_params("test-plugin.difypkg"),
                input_path: Some(self.root.join("uploads/test-plugin.difypkg")),
                file_size: None,
                created_at_epoch_ms: self.runner.clock().epoch_ms(),
            })
            .await
            .unwrap()
            .applied()
            .unwrap()
    }
}

/// Drain everything queued on a subscription into a compact trace.
fn drain(sub: &mut Subscription) -> Vec<String> {
    std::iter::from_fn(|| sub.try_recv())
        .map(|message| match message {
            JobMessage::Progress(p) => format!("{}:{:.1}", p.status, p.progress),
            JobMessage::Log(l) => format!("log:{}", l.log),
            JobMessage::System(s) => format!("system:{}", s.message),
        })
        .collect()
}

#[tokio::test]
async fn successful_run_completes_with_relocated_artifact() {
    let h = harness(
        FakeScript::new()
            .lines(["downloading x", "unziping y", "repackaging z", "success"])
            .artifact(ARTIFACT),
    );
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.progress, 1.0);
    assert_eq!(done.error, None);
    let output = done.output_path.clone().unwrap();
    assert_eq!(output, h.root.join("outputs/test-plugin-offline.difypkg"));
    assert!(output.exists());
    assert!(!h.root.join(ARTIFACT).exists());
    assert_eq!(
        done.log_text.as_deref(),
        Some("downloading x\nunziping y\nrepackaging z\nsuccess\n")
    );
    assert!(done.started_at_ms.is_some());
    assert!(done.completed_at_ms >= done.started_at_ms);
}

#[tokio::test]
async fn subscriber_sees_logs_and_committed_progress_in_order() {
    let h = harness(
        FakeScript::new()
            .lines(["downloading x", "unziping y", "repackaging z", "success"])
            .artifact(ARTIFACT),
    );
    let job = h.create("job-1").await;
    let mut sub = h.broadcaster.subscribe(&job.id);

    h.runner.run(job).await;

    assert_eq!(
        drain(&mut sub),
        vec![
            "downloading:0.1",
            "log:downloading x",
            "downloading:0.3",
            "log:unziping y",
            "extracting:0.5",
            "log:repackaging z",
            "packaging:0.7",
            "log:success",
            "packaging:0.9",
            "completed:1.0",
        ]
    );
}

#[tokio::test]
async fn failure_line_stops_classification() {
    let h = harness(
        FakeScript::new()
            .lines(["downloading x", "error: disk full", "extracting more", "success"])
            .exit_code(1),
    );
    let job = h.create("job-1").await;
    let mut sub = h.broadcaster.subscribe(&job.id);

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.as_deref().unwrap().contains("disk full"));
    // progress reached before the failure is kept
    assert_eq!(done.progress, 0.3);
    assert_eq!(
        done.log_text.as_deref(),
        Some("downloading x\nerror: disk full\n")
    );
    assert_eq!(
        drain(&mut sub),
        vec![
            "downloading:0.1",
            "log:downloading x",
            "downloading:0.3",
            "log:error: disk full",
            "failed:0.3",
        ]
    );
    let statuses: Vec<JobStatus> = h
        .store
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::JobTransitioned { transition, .. } => Some(transition.status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Downloading, JobStatus::Downloading, JobStatus::Failed]
    );
}

#[tokio::test]
async fn zero_exit_without_artifact_completes_without_output() {
    let h = harness(FakeScript::new().lines(["downloading", "success"]));
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.output_path, None);
    assert_eq!(done.error, None);
}

#[tokio::test]
async fn earlier_outputs_are_not_mistaken_for_artifacts() {
    let h = harness(FakeScript::new().line("success"));
    std::fs::create_dir_all(h.root.join("outputs")).unwrap();
    std::fs::write(h.root.join("outputs/older-offline.difypkg"), b"old").unwrap();
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.output_path, None);
}

#[tokio::test]
async fn nonzero_exit_fails_with_exit_code() {
    let h = harness(FakeScript::new().line("downloading").exit_code(2));
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.error.as_deref(), Some("process exited with code 2"));
    assert_eq!(done.log_text.as_deref(), Some("downloading\n"));
}

#[tokio::test]
async fn launch_error_fails_job() {
    let h = harness(FakeScript::new().launch_error("No such file or directory"));
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    let error = done.error.unwrap();
    assert!(error.contains("failed to launch bash"), "error: {error}");
}

#[tokio::test]
async fn read_error_fails_job() {
    let h = harness(FakeScript::new().line("downloading").read_error("pipe broke"));
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.unwrap().contains("pipe broke"));
}

#[tokio::test]
async fn missing_upload_fails_before_launch() {
    let h = harness(FakeScript::new());
    std::fs::remove_file(h.root.join("uploads/test-plugin.difypkg")).unwrap();
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.unwrap().starts_with("input file not found"));
    assert!(h.process.calls().is_empty());
}

#[tokio::test]
async fn relocation_failure_fails_job() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    config.output_dir = blocker;
    let h = harness_with(
        FakeScript::new().line("success").artifact(ARTIFACT),
        MemoryJobStore::new(),
        dir,
        config,
    );
    let job = h.create("job-1").await;

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done.error.unwrap().starts_with("failed to relocate artifact"));
    assert_eq!(done.output_path, None);
}

#[tokio::test]
async fn blank_lines_are_skipped_and_lines_trimmed() {
    let h = harness(FakeScript::new().lines(["", "   ", "  downloading  ", "\t"]));
    let job = h.create("job-1").await;
    let mut sub = h.broadcaster.subscribe(&job.id);

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.log_text.as_deref(), Some("downloading\n"));
    let logs: Vec<String> = drain(&mut sub)
        .into_iter()
        .filter(|m| m.starts_with("log:"))
        .collect();
    assert_eq!(logs, vec!["log:downloading"]);
}

#[tokio::test]
async fn launches_script_with_mode_arguments_in_project_root() {
    let h = harness(FakeScript::new());
    let job = h.create("job-1").await;

    h.runner.run(job).await;

    let calls = h.process.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, "bash");
    assert_eq!(calls[0].cwd, h.root);
    let input = h.root.join("uploads/test-plugin.difypkg").display().to_string();
    assert_eq!(
        calls[0].args,
        vec!["plugin_repackaging.sh", "local", input.as_str()]
    );
}

#[tokio::test]
async fn terminal_job_is_not_started() {
    let h = harness(FakeScript::new().line("downloading"));
    let job = h.create("job-1").await;
    h.runner
        .record(
            &job.id,
            Transition::new(JobStatus::Cancelled, 0.0, "cancelled", 1_000_000),
        )
        .await
        .unwrap();

    let done = h.runner.run(job).await.unwrap();

    assert_eq!(done.status, JobStatus::Cancelled);
    assert!(h.process.calls().is_empty());
}

#[tokio::test]
async fn rejected_transitions_are_not_published() {
    let h = harness(FakeScript::new());
    let job = h.create("job-1").await;
    h.runner
        .record(&job.id, Transition::failed("boom", 1_000_000))
        .await
        .unwrap();
    let mut sub = h.broadcaster.subscribe(&job.id);

    let late = h
        .runner
        .record(
            &job.id,
            Transition::new(JobStatus::Packaging, 0.7, "late", 1_000_100),
        )
        .await
        .unwrap();

    assert_eq!(late, None);
    assert!(drain(&mut sub).is_empty());
}

#[tokio::test]
async fn every_notification_follows_its_commit() {
    let h = harness(
        FakeScript::new()
            .lines(["downloading", "extract", "package", "success"])
            .artifact(ARTIFACT),
    );
    let job = h.create("job-1").await;

    // The commit hook drains what subscribers saw so far, then notes the
    // commit, so the trace interleaves both in real order.
    let trace = Arc::new(Mutex::new(Vec::<String>::new()));
    let sub = Arc::new(Mutex::new(h.broadcaster.subscribe(&job.id)));
    {
        let trace = Arc::clone(&trace);
        let sub = Arc::clone(&sub);
        h.store.on_commit(move |record| {
            let mut trace = trace.lock();
            trace.extend(drain(&mut sub.lock()).into_iter().map(|m| format!("notify {m}")));
            trace.push(format!("commit {}:{:.1}", record.status, record.progress));
        });
    }

    h.runner.run(job).await;
    trace
        .lock()
        .extend(drain(&mut sub.lock()).into_iter().map(|m| format!("notify {m}")));

    let trace = trace.lock().clone();
    let notified: Vec<&String> = trace
        .iter()
        .filter(|t| t.starts_with("notify ") && !t.starts_with("notify log:"))
        .collect();
    assert_eq!(notified.len(), 6, "trace: {trace:#?}");
    for (i, entry) in trace.iter().enumerate() {
        let Some(progress) = entry.strip_prefix("notify ") else {
            continue;
        };
        if progress.starts_with("log:") {
            continue;
        }
        let commit = format!("commit {progress}");
        assert!(
            trace[..i].contains(&commit),
            "{entry} observed before its commit; trace: {trace:#?}"
        );
    }
}

#[tokio::test]
async fn progress_is_on_disk_when_subscribers_see_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let paths = rpk_storage::StorePaths::in_dir(&dir.path().join("state"));
    let store = WalJobStore::new(Arc::new(rpk_storage::Store::open(&paths).unwrap()));
    let h = harness_with(
        FakeScript::new()
            .lines(["downloading", "unzip", "repackaging"])
            .artifact(ARTIFACT),
        store,
        dir,
        config,
    );
    let job = h.create("job-1").await;
    let mut sub = h.broadcaster.subscribe(&job.id);

    let runner = h.runner.clone();
    let task = tokio::spawn(async move { runner.run(job).await });

    let mut seen = 0;
    while let Some(message) = sub.recv().await {
        let JobMessage::Progress(p) = message else {
            continue;
        };
        let wal = std::fs::read_to_string(&paths.wal_path).unwrap();
        assert!(
            wal.contains(&format!("\"status\":\"{}\"", p.status)),
            "{} published before it was durable",
            p.status
        );
        seen += 1;
        if p.status.is_terminal() {
            break;
        }
    }
    assert_eq!(seen, 5);
    assert_eq!(task.await.unwrap().unwrap().status, JobStatus::Completed);
}

#[test]
fn find_and_relocate_moves_the_newest_package() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let launched_at = SystemTime::now();
    let built = config.project_root.join(ARTIFACT);
    std::fs::create_dir_all(built.parent().unwrap()).unwrap();
    std::fs::write(&built, b"pkg").unwrap();

    let dest = find_and_relocate(&config, launched_at).unwrap().unwrap();

    assert_eq!(dest, config.output_dir.join("test-plugin-offline.difypkg"));
    assert!(dest.is_file());
    assert!(!built.exists());
    // the upload is never taken for the product
    assert!(config.upload_dir.join("test-plugin.difypkg").is_file());
}

#[test]
fn find_and_relocate_without_package_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    assert_eq!(find_and_relocate(&config, SystemTime::now()).unwrap(), None);
}
