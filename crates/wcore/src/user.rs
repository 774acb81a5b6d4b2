// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The authenticated user a worker is currently acting on behalf of.

/// A logged-in user, as returned by `Login` and surfaced through
/// `Daemon::get_user_info`.
///
/// The user token itself lives in the credential store, not here — `User` is
/// the display-facing projection of a successful login, not the credential.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

crate::builder! {
    pub struct UserBuilder => User {
        into { id: String = "usr-test" }
        into { name: String = "Test User" }
        into { email: String = "test@example.com" }
    }
}

#[cfg(test)]
#[path = "user_tests.rs"]
mod tests;
