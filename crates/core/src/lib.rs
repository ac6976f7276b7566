// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rpk-core: data model for the plugin repackaging orchestrator

pub mod clock;
pub mod event;
pub mod id;
pub mod job;
pub mod message;
pub mod mode;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{JobConfig, JobId, JobRecord, JobStatus, Transition};
pub use message::{JobMessage, LogEvent, ProgressEvent, SystemEvent};
pub use mode::{job_name, JobMode};
pub use time_fmt::{format_elapsed, format_elapsed_ms, utc_from_epoch_ms};
