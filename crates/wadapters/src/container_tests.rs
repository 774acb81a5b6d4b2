// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn starter_label_embeds_the_hostname() {
    assert_eq!(starter_label("worker-1"), "run.sath.starter=worker-1");
}

#[test]
fn build_binds_covers_every_logical_volume_and_marks_resource_read_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let job_dir = dir.path().join("job");
    let resource_dir = dir.path().join("resource");

    let binds = ImageBinds::default();
    let result = build_binds(&binds, &job_dir, &resource_dir).expect("build_binds");

    assert_eq!(result.len(), LOGICAL_VOLUMES.len());
    assert!(result.iter().any(|b| b.ends_with(":ro") && b.contains("/resource")));
    assert!(result.iter().all(|b| !b.starts_with(':')));

    for volume in ["data", "source", "output"] {
        assert!(job_dir.join(volume).is_dir(), "expected {volume} dir to be created");
    }
    assert!(resource_dir.is_dir());
}

#[test]
fn build_binds_uses_custom_container_paths_from_image_spec() {
    let dir = tempfile::tempdir().expect("tempdir");
    let job_dir = dir.path().join("job");
    let resource_dir = dir.path().join("resource");

    let mut binds = ImageBinds::default();
    binds.insert("data", "/mnt/custom-data");
    let result = build_binds(&binds, &job_dir, &resource_dir).expect("build_binds");

    assert!(result.iter().any(|b| b.ends_with(":/mnt/custom-data")));
}
