// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the outward-facing collaborators in this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("rpc call failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("credential store error: {0}")]
    Storage(#[from] wk_storage::StorageError),

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("container runtime error: {0}")]
    Container(#[from] bollard::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scheduler address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },
}

impl AdapterError {
    /// True for a gRPC `UNAVAILABLE` status or a transport-level failure —
    /// the transient cases, which callers retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdapterError::Transport(_))
            || matches!(self, AdapterError::Rpc(status) if status.code() == tonic::Code::Unavailable)
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AdapterError::Rpc(status) if status.code() == tonic::Code::Unauthenticated)
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AdapterError::Rpc(status) if status.code() == tonic::Code::InvalidArgument)
    }
}
