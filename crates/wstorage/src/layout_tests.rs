// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wk_core::{ContainerId, ExecId, ResourceId};

#[test]
fn job_work_dir_is_named_by_exec_id_under_data() {
    let layout = HomeLayout::new("/home/worker");
    let exec = ExecId::from_string("exc-E1");
    assert_eq!(layout.job_work_dir(exec), PathBuf::from("/home/worker/data/job_exc-E1"));
}

#[test]
fn resource_dir_is_named_by_resource_id_under_data() {
    let layout = HomeLayout::new("/home/worker");
    let resource = ResourceId::from_string("res-R1");
    assert_eq!(layout.resource_dir(resource), PathBuf::from("/home/worker/data/resource_res-R1"));
}

#[test]
fn container_work_dir_is_named_by_container_id_under_data() {
    let layout = HomeLayout::new("/home/worker");
    let container = ContainerId::from_string("cnt-C1");
    assert_eq!(layout.container_work_dir(container), PathBuf::from("/home/worker/data/container_cnt-C1"));
}

#[test]
fn log_paths_live_under_log_dir() {
    let layout = HomeLayout::new("/home/worker");
    assert_eq!(layout.jobs_log(), PathBuf::from("/home/worker/log/jobs.log"));
    assert_eq!(layout.err_log(), PathBuf::from("/home/worker/log/err.log"));
    assert_eq!(layout.out_log(), PathBuf::from("/home/worker/log/out.log"));
}

#[test]
fn ensure_dirs_creates_data_and_log_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let layout = HomeLayout::new(dir.path());
    layout.ensure_dirs().expect("ensure_dirs");
    assert!(layout.data_root().is_dir());
    assert!(layout.log_dir().is_dir());
}
