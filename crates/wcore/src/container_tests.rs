// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn record() -> ContainerRecord {
    ContainerRecord::new("base", GpuOption::None, ImageBinds::default(), PathBuf::from("/work/container_a1"))
}

#[test]
fn new_container_is_uninitialized_and_unattached() {
    let c = record();
    assert!(!c.is_initialized());
    assert!(!c.is_attached());
}

#[test]
fn attach_succeeds_when_free() {
    let mut c = record();
    let job = JobId::new();
    assert!(c.attach(job));
    assert!(c.is_attached());
    assert_eq!(c.current_job, Some(job));
}

#[test]
fn attach_is_idempotent_for_the_same_job() {
    let mut c = record();
    let job = JobId::new();
    assert!(c.attach(job));
    assert!(c.attach(job));
}

#[test]
fn attach_refuses_a_second_job_while_busy() {
    let mut c = record();
    let first = JobId::new();
    let second = JobId::new();
    assert!(c.attach(first));
    assert!(!c.attach(second), "I4: at most one currentJob at a time");
    assert_eq!(c.current_job, Some(first));
}

#[test]
fn detach_frees_the_container_for_reuse() {
    let mut c = record();
    let first = JobId::new();
    let second = JobId::new();
    assert!(c.attach(first));
    c.detach();
    assert!(!c.is_attached());
    assert!(c.attach(second));
}

#[test]
fn starter_label_embeds_hostname() {
    assert_eq!(ContainerRecord::starter_label("worker-7"), "run.sath.starter=worker-7");
}
