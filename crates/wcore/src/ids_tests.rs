// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn each_id_type_carries_its_own_prefix() {
    assert!(JobId::new().as_str().starts_with("job-"));
    assert!(ExecId::new().as_str().starts_with("exc-"));
    assert!(DeviceId::new().as_str().starts_with("dev-"));
    assert!(ContainerId::new().as_str().starts_with("cnt-"));
    assert!(ResourceId::new().as_str().starts_with("res-"));
    assert!(WorkerRunId::new().as_str().starts_with("run-"));
}

#[test]
fn job_id_and_exec_id_are_distinct_types_even_with_equal_text() {
    let job = JobId::from_string("job-abc");
    let exec = ExecId::from_string("exc-abc");
    assert_ne!(job.as_str(), exec.as_str());
}
