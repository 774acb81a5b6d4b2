// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-lease runtime record and its state machine.

use std::path::PathBuf;

use crate::ids::{ContainerId, ExecId, JobId};
use crate::lease::JobMetadata;

/// A Job's position in the three-phase pipeline.
///
/// Transitions are monotonic within a run with one exception: `Paused`
/// overlays `Running` without changing the stored state — see
/// [`JobRecord::paused`]/[`JobRecord::set_paused`], which track the overlay
/// out of band rather than as a 15th variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum JobState {
    Initialized,
    PreparingImage,
    DownloadingResources,
    ProcessingResources,
    DownloadingInputs,
    ProcessingInputs,
    Queuing,
    PreparingContainer,
    Running,
    ProcessingOutputs,
    Success,
    Error,
    Canceled,
}

crate::simple_display! {
    JobState {
        Initialized => "Initialized",
        PreparingImage => "PreparingImage",
        DownloadingResources => "DownloadingResources",
        ProcessingResources => "ProcessingResources",
        DownloadingInputs => "DownloadingInputs",
        ProcessingInputs => "ProcessingInputs",
        Queuing => "Queuing",
        PreparingContainer => "PreparingContainer",
        Running => "Running",
        ProcessingOutputs => "ProcessingOutputs",
        Success => "Success",
        Error => "Error",
        Canceled => "Canceled",
    }
}

impl JobState {
    /// Terminal states never transition further; the scheduler drops the Job
    /// after sending its terminal notification.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Success | JobState::Error | JobState::Canceled)
    }

    /// The state immediately following `self` on the happy path, or `None`
    /// for terminal states. Used to assert monotonicity in tests; the real
    /// pipeline advances state explicitly per phase, not via this table.
    pub fn next(self) -> Option<JobState> {
        use JobState::*;
        Some(match self {
            Initialized => PreparingImage,
            PreparingImage => DownloadingResources,
            DownloadingResources => ProcessingResources,
            ProcessingResources => DownloadingInputs,
            DownloadingInputs => ProcessingInputs,
            ProcessingInputs => Queuing,
            Queuing => PreparingContainer,
            PreparingContainer => Running,
            Running => ProcessingOutputs,
            ProcessingOutputs => Success,
            Success | Error | Canceled => return None,
        })
    }
}

/// Status of one collected or uploaded output, reported in the terminal
/// notification's `outputs` field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputResult {
    pub id: String,
    pub status: OutputStatus,
    pub message: Option<String>,
    /// Present only for inline outputs that fit within the 128 KiB cap.
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OutputStatus {
    Success,
    Error,
}

/// Maximum size, in bytes, of an output returned inline in the terminal
/// notification. Larger inline outputs are reported as `Error`.
pub const MAX_INLINE_OUTPUT_BYTES: usize = 128 * 1024;

/// Mutable per-lease runtime state owned by the Scheduler while a Job is
/// alive.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub lease: JobMetadata,
    pub state: JobState,
    /// `Paused` overlays `Running` per I3: set alongside `state` but never
    /// replaces it, so a resumed Job continues from the stored state as if
    /// the pause never happened.
    paused: bool,
    pub work_dir: PathBuf,
    pub container_id: Option<ContainerId>,
    pub err: Option<String>,
    pub outputs: Vec<OutputResult>,
}

impl JobRecord {
    pub fn new(lease: JobMetadata, work_dir: PathBuf) -> Self {
        Self {
            lease,
            state: JobState::Initialized,
            paused: false,
            work_dir,
            container_id: None,
            err: None,
            outputs: Vec::new(),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.lease.job_id
    }

    pub fn exec_id(&self) -> ExecId {
        self.lease.exec_id
    }

    pub fn data_dir(&self) -> PathBuf {
        self.work_dir.join("data")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join("output")
    }

    /// Shared, content-addressed resource directory for this lease's
    /// `resourceId` — a sibling of `work_dir`, not a subdirectory, so it
    /// outlives any single Job.
    pub fn resource_dir(&self) -> PathBuf {
        self.work_dir
            .parent()
            .map(|p| p.join(format!("resource_{}", self.lease.resource_id)))
            .unwrap_or_else(|| PathBuf::from(format!("resource_{}", self.lease.resource_id)))
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Advance to `next`, refusing to move a terminal Job further.
    pub fn transition(&mut self, next: JobState) {
        if self.state.is_terminal() {
            return;
        }
        self.state = next;
    }

    /// Records the terminal error without moving `state` off the phase that
    /// failed — the remote sees the phase the job died in, not a synthetic
    /// `Error` state, and learns about the failure from the flag bit alone.
    pub fn fail(&mut self, err: impl Into<String>) {
        self.err = Some(err.into());
    }

    pub fn succeed(&mut self) {
        self.state = JobState::Success;
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
