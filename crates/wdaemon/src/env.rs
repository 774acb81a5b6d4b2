// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon binary.

use std::time::Duration;

/// `docker` means this worker is itself running inside a container;
/// callers use this to decide whether bind-mount host paths need
/// translation before being handed to the container runtime.
pub fn running_in_docker() -> bool {
    std::env::var("SATH_ENV").map(|v| v == "docker").unwrap_or(false)
}

/// Fallback RPC endpoint, used when no endpoint is given on the command
/// line.
pub fn grpc_endpoint() -> Option<String> {
    std::env::var("SATH_GRPC").ok().filter(|s| !s.is_empty())
}

/// `debug` disables TLS and raises the log verbosity.
pub fn debug_mode() -> bool {
    std::env::var("SATH_MODE").map(|v| v == "debug").unwrap_or(false)
}

/// The value stamped on every container this worker starts, identifying
/// the daemon family that owns it for orphan cleanup.
pub fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string())
}

/// How many jobs the scheduler may run concurrently; defaults to 1.
pub fn max_concurrent_jobs() -> usize {
    std::env::var("WORKER_MAX_CONCURRENT_JOBS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// How often the scheduler polls `GetNewJob` when it has spare capacity.
pub fn fetch_interval() -> Duration {
    std::env::var("WORKER_FETCH_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
