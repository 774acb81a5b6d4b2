// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn store() -> (tempfile::TempDir, CredentialStore) {
    let dir = tempdir().expect("tempdir");
    let store = CredentialStore::open(dir.path()).expect("open");
    (dir, store)
}

#[test]
fn device_token_is_absent_until_set() {
    let (_dir, store) = store();
    assert_eq!(store.device_token().expect("get"), None);
}

#[test]
fn set_and_get_device_token_roundtrips() {
    let (_dir, store) = store();
    store.set_device_token("dev-abc").expect("set");
    assert_eq!(store.device_token().expect("get"), Some("dev-abc".to_string()));
}

#[test]
fn empty_string_is_distinct_from_absent() {
    let (_dir, store) = store();
    store.set_user_token("").expect("set");
    assert_eq!(store.user_token().expect("get"), Some(String::new()));
}

#[test]
fn clear_user_token_removes_it_but_not_device_token() {
    let (_dir, store) = store();
    store.set_device_token("dev-abc").expect("set");
    store.set_user_token("usr-xyz").expect("set");
    store.clear_user_token().expect("clear");
    assert_eq!(store.user_token().expect("get"), None);
    assert_eq!(store.device_token().expect("get"), Some("dev-abc".to_string()));
}

#[test]
fn reopening_the_same_home_sees_prior_writes() {
    let dir = tempdir().expect("tempdir");
    {
        let store = CredentialStore::open(dir.path()).expect("open");
        store.set_device_token("dev-persisted").expect("set");
    }
    let store = CredentialStore::open(dir.path()).expect("reopen");
    assert_eq!(store.device_token().expect("get"), Some("dev-persisted".to_string()));
}
