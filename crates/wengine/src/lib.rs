// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wk-engine: the command channel (C5), the per-job state machine (C7), the
//! scheduler event loop (C8), and the daemon façade (C9) that ties them to
//! the outward collaborators in `wk-adapters`.
//!
//! Nothing below owns I/O primitives directly — `wk-adapters` does that —
//! this crate owns the decisions: which job runs next, which container it
//! runs in, what state it's in, and what gets reported back.

pub mod daemon;
pub mod error;
pub mod heartbeat;
pub mod job;
pub mod scheduler;

pub use daemon::Daemon;
pub use error::EngineError;
pub use heartbeat::{CommandHandler, Heartbeat};
pub use job::{JobDeps, JobEngine};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStatus};
