// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error kind shared by every collaborator in this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Adapter(#[from] wk_adapters::AdapterError),

    #[error(transparent)]
    Core(#[from] wk_core::WorkerError),

    #[error(transparent)]
    Storage(#[from] wk_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("notification stream closed before CloseAndRecv")]
    NotificationStreamClosed,

    /// A `Start`/`Pause` transition was requested while another was already
    /// in flight (the scheduler's try-lock contract).
    #[error("action busy")]
    ActionBusy,
}

impl EngineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Adapter(e) if e.is_transient())
    }
}
