// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn handler_reports_invalid_state_once_the_daemon_is_gone() {
    let handler = DaemonHandler { daemon: std::sync::Weak::new() };
    let status = handler.handle("Pause", &HashMap::new()).await;
    assert_eq!(status, CommandStatusWire::CommandStatusInvalidState);
}

#[tokio::test]
async fn the_dead_daemon_check_runs_before_the_command_is_even_inspected() {
    let handler = DaemonHandler { daemon: std::sync::Weak::new() };
    let status = handler.handle("DoSomethingElse", &HashMap::new()).await;
    assert_eq!(status, CommandStatusWire::CommandStatusInvalidState);
}
