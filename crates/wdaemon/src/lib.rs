// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wk-daemon: the binary that wires `wk-storage`/`wk-adapters`/`wk-engine`
//! together into a running worker — argument parsing, logging setup, the
//! startup sequence, and graceful shutdown. Exposed as a library so its
//! pieces are independently testable; `main.rs` is a thin driver.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;

pub use lifecycle::{StartupConfig, StartupError, Started};
