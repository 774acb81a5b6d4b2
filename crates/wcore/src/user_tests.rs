// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_populates_all_fields() {
    let u = User::new("usr-1", "Ada", "ada@example.com");
    assert_eq!(u.id, "usr-1");
    assert_eq!(u.name, "Ada");
    assert_eq!(u.email, "ada@example.com");
}

#[test]
fn builder_has_usable_defaults() {
    let u = UserBuilder::default().build();
    assert_eq!(u.id, "usr-test");
    assert_eq!(u.email, "test@example.com");
}

#[test]
fn builder_overrides_apply() {
    let u = UserBuilder::default().name("Grace").build();
    assert_eq!(u.name, "Grace");
    assert_eq!(u.id, "usr-test");
}

#[test]
fn serde_roundtrip() {
    let u = User::new("usr-1", "Ada", "ada@example.com");
    let json = serde_json::to_string(&u).expect("serialize");
    let back: User = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(u, back);
}
