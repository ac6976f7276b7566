// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use rpk_core::{Event, JobRecord, JobStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Filter and page for job listings
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Every job record, keyed by job id, as derived from committed events.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: HashMap<String, JobRecord>,
}

impl MaterializedState {
    /// Get a job by ID or unique prefix (like git commit hashes)
    pub fn get_job(&self, id: &str) -> Option<&JobRecord> {
        if let Some(job) = self.jobs.get(id) {
            return Some(job);
        }

        let mut matches = self.jobs.iter().filter(|(k, _)| k.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some((_, job)), None) => Some(job),
            _ => None,
        }
    }

    /// Jobs matching `filter`, newest first.
    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<&JobRecord> {
        let mut jobs: Vec<&JobRecord> = self
            .jobs
            .values()
            .filter(|job| filter.status.map_or(true, |s| job.status == s))
            .collect();
        jobs.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.cmp(&a.id))
        });
        jobs.into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Jobs that have not reached a terminal status.
    pub fn non_terminal_jobs(&self) -> Vec<&JobRecord> {
        self.jobs.values().filter(|job| !job.is_terminal()).collect()
    }

    /// Whether applying `event` would change anything.
    ///
    /// The store consults this before writing so rejected events (a reused
    /// id, a transition after a terminal status) never reach the log.
    pub fn accepts(&self, event: &Event) -> bool {
        match event {
            Event::JobCreated { id, .. } => !self.jobs.contains_key(id.as_str()),
            Event::JobTransitioned { id, transition } => self
                .jobs
                .get(id.as_str())
                .is_some_and(|job| job.accepts(transition)),
            Event::JobOutputRecorded { id, .. } => self
                .jobs
                .get(id.as_str())
                .is_some_and(|job| !job.is_terminal() && job.output_path.is_none()),
        }
    }

    /// Apply an event to derive state changes.
    ///
    /// Idempotent: replaying an event that is already reflected is a no-op,
    /// so the WAL entry at a snapshot's boundary can be replayed safely.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated {
                id,
                name,
                mode,
                params,
                input_path,
                file_size,
                created_at_epoch_ms,
            } => {
                self.jobs.entry(id.to_string()).or_insert_with(|| {
                    let mut builder = rpk_core::JobConfig::builder(id.as_str(), *mode)
                        .name(name.clone())
                        .params(params.clone());
                    if let Some(path) = input_path {
                        builder = builder.input_path(path.clone());
                    }
                    if let Some(size) = file_size {
                        builder = builder.file_size(*size);
                    }
                    JobRecord::new_with_epoch_ms(builder.build(), *created_at_epoch_ms)
                });
            }

            Event::JobTransitioned { id, transition } => {
                if let Some(job) = self.jobs.get_mut(id.as_str()) {
                    job.apply_transition(transition);
                }
            }

            Event::JobOutputRecorded { id, path } => {
                if let Some(job) = self.jobs.get_mut(id.as_str()) {
                    job.record_output(path.clone());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
