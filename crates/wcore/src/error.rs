// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the worker daemon.
//!
//! These map 1:1 onto the error kinds the rest of the workspace needs to
//! distinguish by semantic rather than by originating crate: transient RPC
//! failures the caller should retry, auth failures the façade maps to HTTP
//! status codes, and the handful of terminal conditions that end a job or a
//! scheduler action without taking the whole daemon down.

use thiserror::Error;

/// A worker-wide error kind, named by semantic rather than by subsystem.
///
/// Every fallible operation in `wk-core`, `wk-adapters`, and `wk-engine`
/// eventually boils down to one of these. Downstream crates define their own
/// `thiserror` enums for local detail (e.g. a download failure carries the
/// offending URL) and convert into this enum at the boundary where the
/// distinction actually matters (Job termination, façade responses,
/// scheduler try-locks).
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A remote call failed in a way the caller should retry (stream EOF,
    /// `Unavailable`, connection reset). Never terminal on its own.
    #[error("transient rpc error: {0}")]
    Transient(String),

    /// `Login` failed because the credentials were rejected.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// `Login` failed because the request itself was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `GetNewJob` returned no lease. Not an error condition by itself;
    /// carried as a variant so callers can match on it instead of consulting
    /// a side channel.
    #[error("no job available")]
    NoJobAvailable,

    /// A `Start`/`Pause` transition was requested while another one was
    /// already in flight.
    #[error("action busy")]
    ActionBusy,

    /// An input or resource download failed; terminates the owning Job.
    #[error("download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Collecting or uploading an output failed; recorded per-output, does
    /// not by itself fail the Job.
    #[error("output processing failed: {0}")]
    OutputFailed(String),

    /// The container runtime returned an error (pull/create/start/exec).
    #[error("container runtime error: {0}")]
    ContainerRuntime(String),

    /// The scheduler loop observed a Job in a state its dispatch `match`
    /// doesn't account for. Programmer error; fatal to the process.
    #[error("unexpected job state: {0}")]
    UnexpectedState(String),
}

impl WorkerError {
    /// True for errors a caller may retry after a short backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, WorkerError::Transient(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
