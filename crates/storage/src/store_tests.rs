// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rpk_core::test_support::{failed_event, job_created_event, output_event, transition_event};
use rpk_core::JobStatus;
use tempfile::{tempdir, TempDir};

fn open_store() -> (TempDir, StorePaths, Store) {
    let dir = tempdir().unwrap();
    let paths = StorePaths::in_dir(dir.path());
    let store = Store::open(&paths).unwrap();
    (dir, paths, store)
}

#[test]
fn commit_returns_post_commit_record() {
    let (_dir, _paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();

    let record = store
        .commit(transition_event("job-1", JobStatus::Downloading, 0.3))
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(record.status, JobStatus::Downloading);
    assert_eq!(record.progress, 0.3);
    assert_eq!(store.get("job-1").unwrap(), record);
}

#[test]
fn commit_is_durable_before_return() {
    let (_dir, paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();

    let wal = std::fs::read_to_string(&paths.wal_path).unwrap();
    assert!(wal.contains("\"type\":\"job:created\""), "wal: {wal}");
}

#[test]
fn rejected_commit_writes_nothing() {
    let (_dir, paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();
    store
        .commit(transition_event("job-1", JobStatus::Cancelled, 0.0))
        .unwrap();
    let before = std::fs::read_to_string(&paths.wal_path).unwrap();

    let late = store
        .commit(transition_event("job-1", JobStatus::Packaging, 0.7))
        .unwrap();
    assert_eq!(late, Commit::Rejected);
    assert_eq!(
        store.commit(output_event("job-1", "/out/x.difypkg")).unwrap(),
        Commit::Rejected
    );
    assert_eq!(std::fs::read_to_string(&paths.wal_path).unwrap(), before);
    assert_eq!(store.get("job-1").unwrap().status, JobStatus::Cancelled);
}

#[test]
fn reopen_replays_wal() {
    let (_dir, paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();
    store.commit(failed_event("job-1", "disk full")).unwrap();
    drop(store);

    let store = Store::open(&paths).unwrap();
    let job = store.get("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("disk full"));
}

#[test]
fn checkpoint_then_reopen_recovers_everything() {
    let (_dir, paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();
    store
        .commit(transition_event("job-1", JobStatus::Extracting, 0.5))
        .unwrap();

    let result = store.checkpoint().unwrap().unwrap();
    assert_eq!(result.seq, 2);

    // committed after the checkpoint: must come from the WAL
    store.commit(job_created_event("job-2")).unwrap();
    drop(store);

    let store = Store::open(&paths).unwrap();
    assert_eq!(store.get("job-1").unwrap().status, JobStatus::Extracting);
    assert!(store.get("job-2").is_some());

    // sequence numbers keep increasing across checkpoint + reopen
    store.commit(job_created_event("job-3")).unwrap();
    drop(store);
    let store = Store::open(&paths).unwrap();
    assert!(store.get("job-3").is_some());
}

#[test]
fn checkpoint_with_empty_store_is_noop() {
    let (_dir, paths, store) = open_store();
    assert!(store.checkpoint().unwrap().is_none());
    assert!(!paths.snapshot_path.exists());
}

#[test]
fn non_terminal_lists_open_jobs() {
    let (_dir, _paths, store) = open_store();
    store.commit(job_created_event("a")).unwrap();
    store.commit(job_created_event("b")).unwrap();
    store.commit(failed_event("b", "x")).unwrap();

    let open: Vec<_> = store.non_terminal().into_iter().map(|j| j.id).collect();
    assert_eq!(open, vec![rpk_core::JobId::new("a")]);
}

#[test]
fn read_state_sees_commits_of_an_open_store() {
    let (_dir, paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();
    store.checkpoint().unwrap();
    store.commit(job_created_event("job-2")).unwrap();
    store
        .commit(transition_event("job-2", JobStatus::Extracting, 0.5))
        .unwrap();

    let state = Store::read_state(&paths).unwrap();
    assert_eq!(state.jobs.len(), 2);
    assert_eq!(state.get_job("job-2").unwrap().status, JobStatus::Extracting);
}

#[test]
fn read_state_ignores_a_torn_tail_without_rewriting_it() {
    let (_dir, paths, store) = open_store();
    store.commit(job_created_event("job-1")).unwrap();
    drop(store);
    let mut wal = std::fs::read_to_string(&paths.wal_path).unwrap();
    wal.push_str("{\"seq\":2,\"ev");
    std::fs::write(&paths.wal_path, &wal).unwrap();

    let state = Store::read_state(&paths).unwrap();
    assert_eq!(state.jobs.len(), 1);
    assert_eq!(std::fs::read_to_string(&paths.wal_path).unwrap(), wal);
}

#[test]
fn read_state_of_missing_store_is_empty() {
    let dir = tempdir().unwrap();
    let state = Store::read_state(&StorePaths::in_dir(dir.path())).unwrap();
    assert!(state.jobs.is_empty());
}
