// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn image_binds_default_paths_match_the_four_logical_volumes() {
    let binds = ImageBinds::default();
    assert_eq!(binds.path_for("data"), "/data");
    assert_eq!(binds.path_for("source"), "/source");
    assert_eq!(binds.path_for("output"), "/output");
    assert_eq!(binds.path_for("resource"), "/resource");
}

#[test]
fn image_binds_override_takes_precedence_over_default() {
    let mut binds = ImageBinds::default();
    binds.insert("output", "/mnt/out");
    assert_eq!(binds.path_for("output"), "/mnt/out");
    assert_eq!(binds.path_for("data"), "/data");
}

#[test]
fn image_binds_from_iter_drops_unknown_logical_names() {
    let binds: ImageBinds = vec![
        ("data".to_string(), "/d".to_string()),
        ("bogus".to_string(), "/x".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(binds.path_for("data"), "/d");
    assert_eq!(binds.path_for("bogus"), "/data");
}

#[test]
fn gpu_option_wants_gpu_only_when_not_none() {
    assert!(!GpuOption::None.wants_gpu());
    assert!(GpuOption::Preferred.wants_gpu());
    assert!(GpuOption::Required.wants_gpu());
}

#[test]
fn file_ref_inline_output_has_no_request() {
    let f = FileRef::inline_output("o1", "r.txt");
    assert!(f.is_inline());
}

#[test]
fn file_ref_fetched_output_is_not_inline() {
    let f = FileRef::fetched(
        "o1",
        "r.txt",
        RequestSpec { method: "PUT".into(), url: "http://x/y".into(), headers: Default::default() },
    );
    assert!(!f.is_inline());
}

#[test]
fn job_metadata_builder_produces_distinct_ids_by_default() {
    let a = JobMetadataBuilder::default().build();
    let b = JobMetadataBuilder::default().build();
    assert_ne!(a.job_id, b.job_id);
}
