// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wk-core: domain data model for the worker daemon.
//!
//! IDs, the lease handed out by the scheduler, the per-job and
//! per-container runtime records, the clock abstraction used for testable
//! timing, and the shared error kind. This crate does no I/O; it is pure
//! data plus the transitions cheap enough to be infallible (state machine
//! steps, bind-path lookups). Everything that talks to the network, the
//! filesystem, or Docker lives in `wk-adapters` and `wk-engine`.

pub mod macros;

pub mod clock;
pub mod container;
pub mod error;
pub mod id;
pub mod ids;
pub mod job;
pub mod lease;
pub mod user;

pub use clock::{Clock, FakeClock, SystemClock};
pub use container::ContainerRecord;
pub use error::WorkerError;
pub use id::short;
pub use ids::{ContainerId, DeviceId, ExecId, JobId, ResourceId, WorkerRunId};
pub use job::{JobRecord, JobState, OutputResult, OutputStatus, MAX_INLINE_OUTPUT_BYTES};
pub use lease::{
    FileRef, GpuOption, ImageBinds, ImageSpec, JobMetadata, RequestSpec, ResourceFile,
    LOGICAL_VOLUMES,
};
#[cfg(any(test, feature = "test-support"))]
pub use user::UserBuilder;
pub use user::User;
