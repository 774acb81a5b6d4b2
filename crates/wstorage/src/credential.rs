// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The credential store (C1): a single `sled` tree named `v0/credential`
//! holding the device token and, optionally, the user token.
//!
//! Grounded on `original_source/meta/db.go` + `meta/credential.go`, which
//! open a single `bbolt` file (`meta.db`) and keep credentials in one
//! bucket keyed by a schema-versioned name (`v0`). `sled`'s tree API maps
//! directly onto bbolt's bucket API: one `sled::Tree` per bbolt bucket, one
//! `insert`/`get`/`remove` per bbolt `Put`/`Get`/`Delete`.

use std::path::Path;

use crate::error::StorageError;

const CREDENTIAL_TREE: &str = "v0/credential";
const KEY_DEVICE_TOKEN: &str = "devicetoken";
const KEY_USER_TOKEN: &str = "usertoken";

/// Opens and owns the `meta.db` sled database under a worker's home
/// directory.
pub struct CredentialStore {
    tree: sled::Tree,
}

impl CredentialStore {
    /// Opens (creating if absent) `meta.db` at `home` and the credential
    /// tree within it.
    pub fn open(home: &Path) -> Result<Self, StorageError> {
        let path = home.join("meta.db");
        let db = sled::open(&path).map_err(|source| StorageError::Open { path, source })?;
        let tree = db.open_tree(CREDENTIAL_TREE)?;
        Ok(Self { tree })
    }

    /// Opens a store directly on an already-open `sled::Db`, used by tests
    /// that want an in-memory/tempdir database without going through
    /// `open`.
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        let tree = db.open_tree(CREDENTIAL_TREE)?;
        Ok(Self { tree })
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.tree.get(key)? {
            Some(bytes) => {
                let s = std::str::from_utf8(&bytes)
                    .map_err(|_| StorageError::InvalidEncoding { key: key.to_string() })?
                    .to_string();
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.tree.insert(key, value.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.tree.remove(key)?;
        self.tree.flush()?;
        Ok(())
    }

    /// `None` when no device token has ever been issued; absence is
    /// distinct from an empty string.
    pub fn device_token(&self) -> Result<Option<String>, StorageError> {
        self.get(KEY_DEVICE_TOKEN)
    }

    pub fn set_device_token(&self, token: &str) -> Result<(), StorageError> {
        self.set(KEY_DEVICE_TOKEN, token)
    }

    pub fn user_token(&self) -> Result<Option<String>, StorageError> {
        self.get(KEY_USER_TOKEN)
    }

    pub fn set_user_token(&self, token: &str) -> Result<(), StorageError> {
        self.set(KEY_USER_TOKEN, token)
    }

    /// Clears the user token on logout; the device token is untouched.
    pub fn clear_user_token(&self) -> Result<(), StorageError> {
        self.remove(KEY_USER_TOKEN)
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
