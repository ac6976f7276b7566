// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Job execution engine: phase inference, fan-out, runner, and supervisor

mod args;
mod artifact;
mod broadcast;
mod classify;
mod config;
mod error;
mod job_logger;
pub mod log_paths;
mod runner;
mod store;
mod supervisor;

pub use args::{build_args, DEFAULT_SUFFIX};
pub use artifact::{relocate, ArtifactSearch};
pub use broadcast::{Broadcaster, SubscriberId, Subscription};
pub use classify::{classify, Classification};
pub use config::{RunnerConfig, DEFAULT_MAX_CONCURRENT_JOBS};
pub use error::{RunError, SupervisorError};
pub use job_logger::JobLogger;
pub use runner::JobRunner;
pub use store::{JobStore, WalJobStore};
pub use supervisor::{JobRequest, Supervisor, SupervisorDeps, INTERRUPTED};

#[cfg(any(test, feature = "test-support"))]
pub use store::MemoryJobStore;
