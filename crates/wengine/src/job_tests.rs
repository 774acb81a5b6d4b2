// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn file_ref(id: &str, path: &str) -> FileRef {
    FileRef { id: id.to_string(), path: path.to_string(), request: None }
}

#[tokio::test]
async fn process_output_inline_returns_content_when_within_cap() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("out.txt"), b"hello").await.unwrap();

    let result = process_output(reqwest::Client::new(), dir.path().to_path_buf(), file_ref("o1", "out.txt")).await;

    assert_eq!(result.status, OutputStatus::Success);
    assert_eq!(result.content.as_deref(), Some("hello"));
}

#[tokio::test]
async fn process_output_inline_errors_when_over_cap() {
    let dir = tempfile::tempdir().unwrap();
    let oversized = vec![0u8; MAX_INLINE_OUTPUT_BYTES + 1];
    tokio::fs::write(dir.path().join("out.bin"), &oversized).await.unwrap();

    let result = process_output(reqwest::Client::new(), dir.path().to_path_buf(), file_ref("o1", "out.bin")).await;

    assert_eq!(result.status, OutputStatus::Error);
    assert!(result.message.unwrap().contains("too large"));
    assert!(result.content.is_none());
}

#[tokio::test]
async fn process_output_missing_file_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let result = process_output(reqwest::Client::new(), dir.path().to_path_buf(), file_ref("o1", "missing.txt")).await;

    assert_eq!(result.status, OutputStatus::Error);
    assert!(result.message.unwrap().contains("not found"));
}

#[tokio::test]
async fn process_output_uploads_to_request_url_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("PUT")).and(path("/upload")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("out.txt"), b"payload").await.unwrap();

    let output = FileRef::fetched(
        "o1",
        "out.txt",
        wk_core::RequestSpec { method: "PUT".into(), url: format!("{}/upload", server.uri()), headers: Default::default() },
    );
    let result = process_output(reqwest::Client::new(), dir.path().to_path_buf(), output).await;

    assert_eq!(result.status, OutputStatus::Success);
    assert!(result.content.is_none());
}

#[tokio::test]
async fn process_output_reports_upload_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT")).and(path("/upload")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("out.txt"), b"payload").await.unwrap();

    let output = FileRef::fetched(
        "o1",
        "out.txt",
        wk_core::RequestSpec { method: "PUT".into(), url: format!("{}/upload", server.uri()), headers: Default::default() },
    );
    let result = process_output(reqwest::Client::new(), dir.path().to_path_buf(), output).await;

    assert_eq!(result.status, OutputStatus::Error);
    assert!(result.message.unwrap().contains("500"));
}

#[tokio::test]
async fn move_dir_contents_relocates_every_entry() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    tokio::fs::write(src.path().join("a.txt"), b"a").await.unwrap();
    tokio::fs::write(src.path().join("b.txt"), b"b").await.unwrap();

    move_dir_contents(src.path(), dst.path()).await.unwrap();

    assert_eq!(tokio::fs::read(dst.path().join("a.txt")).await.unwrap(), b"a");
    assert_eq!(tokio::fs::read(dst.path().join("b.txt")).await.unwrap(), b"b");
}

#[tokio::test]
async fn move_dir_contents_tolerates_missing_source() {
    let dst = tempfile::tempdir().unwrap();
    let missing_src = dst.path().join("does-not-exist");

    move_dir_contents(&missing_src, dst.path()).await.unwrap();
}

#[tokio::test]
async fn clear_dir_removes_files_and_subdirectories_but_not_itself() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("stale.txt"), b"x").await.unwrap();
    tokio::fs::create_dir(dir.path().join("stale_dir")).await.unwrap();

    clear_dir(dir.path()).await.unwrap();

    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}
