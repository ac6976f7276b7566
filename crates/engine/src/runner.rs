// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executes one job end to end.
//!
//! Every state change goes through [`JobStore::commit`] first and is
//! published from the committed record afterwards, so a subscriber never
//! sees a status that is not on disk.

use crate::args::build_args;
use crate::artifact::{relocate, ArtifactSearch};
use crate::broadcast::Broadcaster;
use crate::classify::classify;
use crate::config::RunnerConfig;
use crate::error::RunError;
use crate::job_logger::JobLogger;
use crate::store::JobStore;
use rpk_adapters::{CommandSpec, ProcessAdapter};
use rpk_core::{Clock, Event, JobId, JobMessage, JobRecord, JobStatus, ProgressEvent, Transition};
use rpk_storage::{Commit, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex as AsyncMutex;
use tracing::Instrument;

/// Allowance for coarse filesystem timestamps when matching artifacts to a run
const ARTIFACT_MTIME_SLACK: Duration = Duration::from_secs(2);

/// Runs jobs. Cheap to clone; clones share the store and registry.
pub struct JobRunner<P, S, C> {
    process: P,
    store: S,
    broadcaster: Broadcaster,
    clock: C,
    config: Arc<RunnerConfig>,
    logger: JobLogger,
    gates: CommitGates,
}

/// Per-job locks held across commit and publish.
#[derive(Clone, Default)]
struct CommitGates {
    gates: Arc<Mutex<HashMap<JobId, Arc<AsyncMutex<()>>>>>,
}

impl CommitGates {
    fn gate(&self, id: &JobId) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.gates.lock().entry(id.clone()).or_default())
    }

    fn forget(&self, id: &JobId) {
        self.gates.lock().remove(id);
    }
}

impl<P: Clone, S: Clone, C: Clone> Clone for JobRunner<P, S, C> {
    fn clone(&self) -> Self {
        Self {
            process: self.process.clone(),
            store: self.store.clone(),
            broadcaster: self.broadcaster.clone(),
            clock: self.clock.clone(),
            config: Arc::clone(&self.config),
            logger: self.logger.clone(),
            gates: self.gates.clone(),
        }
    }
}

impl<P, S, C> JobRunner<P, S, C>
where
    P: ProcessAdapter,
    S: JobStore,
    C: Clock,
{
    pub fn new(
        process: P,
        store: S,
        broadcaster: Broadcaster,
        clock: C,
        config: Arc<RunnerConfig>,
    ) -> Self {
        let logger = JobLogger::new(config.log_dir.clone());
        Self {
            process,
            store,
            broadcaster,
            clock,
            config,
            logger,
            gates: CommitGates::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Drive `job` to a terminal state and return the final record.
    ///
    /// Never fails: any fault along the way becomes the job's FAILED
    /// transition. A job cancelled meanwhile keeps its CANCELLED status.
    pub async fn run(&self, job: JobRecord) -> Option<JobRecord> {
        let span = tracing::info_span!("job.run", job_id = %job.id, mode = %job.mode);
        async {
            tracing::info!(name = %job.name, "starting");
            if let Err(e) = self.execute(&job).await {
                tracing::warn!(error = %e, "job failed");
                self.fail(&job.id, e.to_string(), None).await;
            }
            let last = self.store.get(job.id.as_str());
            self.forget(&job.id);
            if let Some(record) = &last {
                tracing::info!(status = %record.status, "finished");
            }
            last
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, job: &JobRecord) -> Result<(), RunError> {
        let id = &job.id;
        let started = self
            .record(
                id,
                Transition::new(JobStatus::Downloading, 0.1, "started", self.clock.epoch_ms()),
            )
            .await?;
        if started.is_none() {
            tracing::info!("job already terminal, not starting");
            return Ok(());
        }

        let mut args: Vec<String> = self.config.script.iter().cloned().collect();
        args.extend(build_args(job.mode, &job.params, &self.config.upload_dir)?);
        let spec = CommandSpec {
            program: self.config.executable.clone(),
            args,
            cwd: self.config.project_root.clone(),
        };
        self.logger
            .append(id.as_str(), self.clock.epoch_ms(), "spawn", &spec.display())
            .await;

        let launched_at = SystemTime::now();
        let mut process = self.process.spawn(&spec).await?;

        let mut transcript = String::new();
        let mut failed_in_output = false;
        while let Some(raw) = process.next_line().await? {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            transcript.push_str(line);
            transcript.push('\n');

            let now = self.clock.epoch_ms();
            self.logger.append(id.as_str(), now, "output", line).await;
            self.broadcaster.publish(id, JobMessage::log(id, line, now));

            let Some(phase) = classify(line) else {
                continue;
            };
            if phase.stops_output() {
                let transition = Transition {
                    status: JobStatus::Failed,
                    progress: phase.progress,
                    step: phase.step,
                    error: Some(phase.message),
                    log_text: Some(transcript.clone()),
                    epoch_ms: now,
                };
                self.record(id, transition).await?;
                failed_in_output = true;
                break;
            }
            self.record(
                id,
                Transition::new(phase.status, phase.progress, phase.step, now),
            )
            .await?;
        }

        let code = process.wait().await?;
        self.logger.append(
            id.as_str(),
            self.clock.epoch_ms(),
            "exit",
            &format!("process exited with code {code}"),
        )
        .await;
        if failed_in_output {
            return Ok(());
        }
        if code != 0 {
            self.fail(id, format!("process exited with code {code}"), Some(transcript))
                .await;
            return Ok(());
        }
        if self
            .store
            .get(id.as_str())
            .is_some_and(|record| record.is_terminal())
        {
            tracing::info!("job already terminal, leaving artifacts in place");
            return Ok(());
        }

        self.collect_artifact(id, launched_at).await?;
        self.record(
            id,
            Transition::new(JobStatus::Completed, 1.0, "completed", self.clock.epoch_ms())
                .with_log_text(transcript),
        )
        .await?;
        Ok(())
    }

    async fn collect_artifact(&self, id: &JobId, launched_at: SystemTime) -> Result<(), RunError> {
        // The walk and a cross-device copy can take a while: keep them off
        // the async workers other jobs run on.
        let config = Arc::clone(&self.config);
        let moved = tokio::task::spawn_blocking(move || find_and_relocate(&config, launched_at))
            .await??;
        let Some(dest) = moved else {
            tracing::warn!(root = %self.config.project_root.display(), "process succeeded but no artifact was found");
            return Ok(());
        };

        tracing::info!(artifact = %dest.display(), "artifact relocated");
        self.logger.append(
            id.as_str(),
            self.clock.epoch_ms(),
            "artifact",
            &dest.display().to_string(),
        )
        .await;
        self.store
            .commit(Event::JobOutputRecorded {
                id: id.clone(),
                path: dest,
            })
            .await?;
        Ok(())
    }

    /// Commit a transition, then publish the committed record.
    ///
    /// Returns `None` when the store rejected the transition (the job is
    /// already terminal); nothing is published in that case.
    ///
    /// Commit and publish happen under the job's gate, so a transition from
    /// another task (a cancel) cannot be published in between.
    pub async fn record(
        &self,
        id: &JobId,
        transition: Transition,
    ) -> Result<Option<JobRecord>, StoreError> {
        let gate = self.gates.gate(id);
        let _held = gate.lock().await;

        let epoch_ms = transition.epoch_ms;
        let status = transition.status;
        let commit = self
            .store
            .commit(Event::JobTransitioned {
                id: id.clone(),
                transition,
            })
            .await?;

        match commit {
            Commit::Applied(record) => {
                self.broadcaster.publish(
                    id,
                    JobMessage::Progress(ProgressEvent::from_record(&record, epoch_ms)),
                );
                self.logger
                    .append(
                        id.as_str(),
                        epoch_ms,
                        record.status.as_str(),
                        &format!("{:.2} {}", record.progress, record.current_step),
                    )
                    .await;
                Ok(Some(record))
            }
            Commit::Rejected => {
                tracing::debug!(job_id = %id, %status, "transition ignored, job is terminal");
                Ok(None)
            }
        }
    }

    /// Drop the commit gate of a job nothing will record for anymore.
    pub fn forget(&self, id: &JobId) {
        self.gates.forget(id);
    }

    /// Record FAILED with `reason`. Store errors are logged, not returned.
    pub async fn fail(&self, id: &JobId, reason: String, log_text: Option<String>) {
        let mut transition = Transition::failed(reason, self.clock.epoch_ms());
        transition.log_text = log_text;
        if let Err(e) = self.record(id, transition).await {
            tracing::error!(job_id = %id, error = %e, "could not record job failure");
        }
    }
}

/// Newest package produced since launch, moved into the output dir.
fn find_and_relocate(
    config: &RunnerConfig,
    launched_at: SystemTime,
) -> Result<Option<PathBuf>, RunError> {
    let exclude = [config.upload_dir.as_path(), config.output_dir.as_path()];
    let search = ArtifactSearch {
        root: &config.project_root,
        extension: &config.artifact_extension,
        exclude: &exclude,
        modified_since: launched_at.checked_sub(ARTIFACT_MTIME_SLACK),
    };
    let Some(found) = search.find() else {
        return Ok(None);
    };
    relocate(&found, &config.output_dir)
        .map(Some)
        .map_err(|source| RunError::Relocate {
            path: found,
            source,
        })
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
