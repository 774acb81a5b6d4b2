// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lease::{GpuOption, ImageSpec, JobMetadata};
use std::path::PathBuf;

fn lease() -> JobMetadata {
    JobMetadata {
        job_id: JobId::new(),
        exec_id: ExecId::new(),
        image: ImageSpec { url: "base".into(), auth: None, binds: Default::default() },
        cmd: vec!["sh".into(), "-c".into(), "true".into()],
        resource_id: crate::ids::ResourceId::new(),
        resources: Vec::new(),
        inputs: Vec::new(),
        outputs: Vec::new(),
        gpu_conf: GpuOption::None,
    }
}

#[test]
fn new_job_starts_initialized() {
    let job = JobRecord::new(lease(), PathBuf::from("/work/job_e1"));
    assert_eq!(job.state, JobState::Initialized);
    assert!(!job.is_paused());
    assert!(job.container_id.is_none());
}

#[test]
fn data_and_output_dirs_are_subdirectories_of_work_dir() {
    let job = JobRecord::new(lease(), PathBuf::from("/work/job_e1"));
    assert_eq!(job.data_dir(), PathBuf::from("/work/job_e1/data"));
    assert_eq!(job.output_dir(), PathBuf::from("/work/job_e1/output"));
}

#[test]
fn resource_dir_is_sibling_of_work_dir_named_by_resource_id() {
    let mut l = lease();
    l.resource_id = crate::ids::ResourceId::from_string("res-R1");
    let job = JobRecord::new(l, PathBuf::from("/work/job_e1"));
    assert_eq!(job.resource_dir(), PathBuf::from("/work/resource_res-R1"));
}

#[test]
fn transition_follows_happy_path_order() {
    let mut job = JobRecord::new(lease(), PathBuf::from("/work/job_e1"));
    let mut state = job.state;
    let mut seen = vec![state];
    while let Some(next) = state.next() {
        job.transition(next);
        state = next;
        seen.push(state);
    }
    assert_eq!(job.state, JobState::Success);
    assert_eq!(
        seen,
        vec![
            JobState::Initialized,
            JobState::PreparingImage,
            JobState::DownloadingResources,
            JobState::ProcessingResources,
            JobState::DownloadingInputs,
            JobState::ProcessingInputs,
            JobState::Queuing,
            JobState::PreparingContainer,
            JobState::Running,
            JobState::ProcessingOutputs,
            JobState::Success,
        ]
    );
}

#[test]
fn terminal_state_refuses_further_transitions() {
    let mut job = JobRecord::new(lease(), PathBuf::from("/work/job_e1"));
    job.succeed();
    assert_eq!(job.state, JobState::Success);
    job.transition(JobState::Running);
    assert_eq!(job.state, JobState::Success, "transition out of a terminal state must be a no-op");
}

#[test]
fn pause_overlays_running_without_changing_stored_state() {
    let mut job = JobRecord::new(lease(), PathBuf::from("/work/job_e1"));
    job.transition(JobState::Running);
    job.set_paused(true);
    assert_eq!(job.state, JobState::Running);
    assert!(job.is_paused());
    job.set_paused(false);
    assert_eq!(job.state, JobState::Running);
    assert!(!job.is_paused());
}

#[test]
fn fail_records_error_message_without_moving_off_the_failing_phase() {
    let mut job = JobRecord::new(lease(), PathBuf::from("/work/job_e1"));
    job.transition(JobState::DownloadingInputs);
    job.fail("404 on input");
    assert_eq!(job.err.as_deref(), Some("404 on input"));
    assert_eq!(job.state, JobState::DownloadingInputs, "state stays at the phase that failed, per I3");
}

#[test]
fn success_and_error_and_canceled_are_terminal() {
    assert!(JobState::Success.is_terminal());
    assert!(JobState::Error.is_terminal());
    assert!(JobState::Canceled.is_terminal());
    assert!(!JobState::Running.is_terminal());
}
