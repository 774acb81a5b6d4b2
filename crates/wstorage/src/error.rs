// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the credential store and filesystem layout helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open credential store at {path}: {source}")]
    Open { path: PathBuf, #[source] source: sled::Error },

    #[error("credential store operation failed: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, #[source] source: std::io::Error },

    #[error("stored value for key {key:?} is not valid UTF-8")]
    InvalidEncoding { key: String },
}
