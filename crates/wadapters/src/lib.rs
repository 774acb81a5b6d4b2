// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wk-adapters: the outward-facing collaborators this worker talks to — the
//! authenticated RPC channel (C3), the system-info reporter, the resource
//! downloader (C4), and the Docker-backed container runtime (C6). Nothing
//! in this crate owns scheduling or job-state decisions; it only talks to
//! the network, the filesystem, and the local Docker daemon on behalf of
//! `wk-engine`.

pub mod connection;
pub mod container;
pub mod error;
pub mod resource;
pub mod system_info;

pub use connection::Connection;
pub use container::{Container, ExecOutput, PullProgress};
pub use error::AdapterError;
pub use resource::{Downloader, Progress, ResourceManager};
