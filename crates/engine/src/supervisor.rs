// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accepts jobs, runs each on its own task, and records cancellation.

use crate::broadcast::{Broadcaster, Subscription};
use crate::config::RunnerConfig;
use crate::error::SupervisorError;
use crate::runner::JobRunner;
use crate::store::JobStore;
use rpk_adapters::ProcessAdapter;
use rpk_core::mode::{param, Params};
use rpk_core::{
    job_name, Clock, Event, IdGen, JobId, JobMessage, JobMode, JobRecord, JobStatus, Transition,
};
use rpk_storage::Commit;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// Error message recorded for jobs a previous process left unfinished
pub const INTERRUPTED: &str = "interrupted: orchestrator restarted";

/// A request to run one job.
///
/// Parameters are taken as already valid for the mode; anything missing
/// surfaces later as the job's failure.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub mode: JobMode,
    pub params: Params,
    pub file_size: Option<u64>,
}

/// Supervisor dependencies
pub struct SupervisorDeps<P, S, C, G> {
    pub process: P,
    pub store: S,
    pub broadcaster: Broadcaster,
    pub clock: C,
    pub ids: G,
}

/// Starts one independent runner per submitted job.
///
/// Jobs never wait for each other: there is no queue and no admission
/// control. `max_concurrent_jobs` only produces a warning when exceeded.
pub struct Supervisor<P, S, C, G> {
    runner: JobRunner<P, S, C>,
    ids: G,
    tracker: TaskTracker,
    active: Arc<AtomicUsize>,
}

impl<P, S, C, G> Supervisor<P, S, C, G>
where
    P: ProcessAdapter,
    S: JobStore,
    C: Clock,
    G: IdGen,
{
    pub fn new(deps: SupervisorDeps<P, S, C, G>, config: RunnerConfig) -> Self {
        Self {
            runner: JobRunner::new(
                deps.process,
                deps.store,
                deps.broadcaster,
                deps.clock,
                Arc::new(config),
            ),
            ids: deps.ids,
            tracker: TaskTracker::new(),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &S {
        self.runner.store()
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        self.runner.broadcaster()
    }

    /// Jobs whose runner has not finished yet
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Create a PENDING record and start its runner. Returns without waiting.
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, SupervisorError> {
        let record = self.create(request).await?;
        let id = record.id.clone();
        self.spawn_runner(record);
        Ok(id)
    }

    /// Like [`Supervisor::submit`], but subscribes before the runner starts,
    /// so the subscription sees every event of the run.
    pub async fn submit_and_subscribe(
        &self,
        request: JobRequest,
    ) -> Result<(JobId, Subscription), SupervisorError> {
        let record = self.create(request).await?;
        let id = record.id.clone();
        let subscription = self.broadcaster().subscribe(&id);
        self.spawn_runner(record);
        Ok((id, subscription))
    }

    async fn create(&self, request: JobRequest) -> Result<JobRecord, SupervisorError> {
        let id = JobId::new(self.ids.next());
        let created_at_epoch_ms = self.runner.clock().epoch_ms();
        let name = job_name(request.mode, &request.params, created_at_epoch_ms);
        let input_path = match request.mode {
            JobMode::Local => request
                .params
                .get(param::FILE_NAME)
                .map(|file| self.runner.config().upload_dir.join(file)),
            JobMode::Market | JobMode::Github => None,
        };

        let event = Event::JobCreated {
            id: id.clone(),
            name,
            mode: request.mode,
            params: request.params,
            input_path,
            file_size: request.file_size,
            created_at_epoch_ms,
        };
        match self.store().commit(event).await? {
            Commit::Applied(record) => {
                tracing::info!(job_id = %id, name = %record.name, mode = %record.mode, "job submitted");
                Ok(record)
            }
            Commit::Rejected => Err(SupervisorError::DuplicateJob(id.to_string())),
        }
    }

    fn spawn_runner(&self, record: JobRecord) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let max = self.runner.config().max_concurrent_jobs;
        if active > max {
            tracing::warn!(active, max, "running jobs exceed max_concurrent_jobs (not enforced)");
        }

        let id = record.id.clone();
        let runner = self.runner.clone();
        let handle = tokio::spawn(async move { runner.run(record).await });

        // The watcher outlives a panicking runner and records the failure,
        // so no job is left non-terminal by a crash.
        let runner = self.runner.clone();
        let active = Arc::clone(&self.active);
        self.tracker.spawn(async move {
            if let Err(e) = handle.await {
                let reason = if e.is_panic() {
                    format!("job runner panicked: {}", panic_message(e.into_panic()))
                } else {
                    "job runner was aborted".to_string()
                };
                tracing::error!(job_id = %id, reason = %reason, "job runner died");
                runner.fail(&id, reason, None).await;
                runner.forget(&id);
            }
            active.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Mark a job CANCELLED.
    ///
    /// Advisory: the external process is not signalled. Its runner keeps
    /// draining output, and the store rejects whatever it tries to record
    /// afterwards. Cancelling a job that already finished returns it as is.
    pub async fn cancel(&self, id: &str) -> Result<JobRecord, SupervisorError> {
        let record = self
            .store()
            .get(id)
            .ok_or_else(|| SupervisorError::JobNotFound(id.to_string()))?;
        if record.is_terminal() {
            return Ok(record);
        }

        let transition = Transition::new(
            JobStatus::Cancelled,
            record.progress,
            "cancelled",
            self.runner.clock().epoch_ms(),
        );
        match self.runner.record(&record.id, transition).await? {
            Some(cancelled) => {
                tracing::info!(job_id = %cancelled.id, "job cancelled");
                Ok(cancelled)
            }
            // Finished between the read and the commit
            None => self
                .store()
                .get(record.id.as_str())
                .ok_or_else(|| SupervisorError::JobNotFound(id.to_string())),
        }
    }

    /// Fail every job a previous process left non-terminal.
    ///
    /// Call once at startup, before submitting anything: at that point no
    /// runner exists for any stored job.
    pub async fn reconcile_orphans(&self) -> Result<usize, SupervisorError> {
        let orphans = self.store().non_terminal();
        for job in &orphans {
            tracing::warn!(job_id = %job.id, status = %job.status, "reconciling interrupted job");
            let transition = Transition::failed(INTERRUPTED, self.runner.clock().epoch_ms());
            self.runner.record(&job.id, transition).await?;
            self.runner.forget(&job.id);
        }
        Ok(orphans.len())
    }

    /// Send a system notice to every subscriber of every job.
    pub fn announce(&self, message: impl Into<String>) -> usize {
        let message = JobMessage::system(message, self.runner.clock().epoch_ms());
        self.broadcaster().broadcast_system(message)
    }

    /// Wait for every started runner to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
