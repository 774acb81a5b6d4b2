// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn only_transient_reports_is_transient() {
    assert!(WorkerError::Transient("eof".into()).is_transient());
    assert!(!WorkerError::NoJobAvailable.is_transient());
    assert!(!WorkerError::ActionBusy.is_transient());
}

#[test]
fn download_failed_message_includes_url_and_reason() {
    let err = WorkerError::DownloadFailed { url: "http://x/y".into(), reason: "404".into() };
    let msg = err.to_string();
    assert!(msg.contains("http://x/y"));
    assert!(msg.contains("404"));
}
