// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn displays_as_raw_string() {
    let id = SessionId::new("sess-abc123");
    assert_eq!(id.to_string(), "sess-abc123");
}

#[test]
fn equality_and_ordering_are_string_based() {
    let a = SessionId::new("a");
    let b = SessionId::new("b");
    assert_ne!(a, b);
    assert!(a < b);
    assert_eq!(a, SessionId::new("a"));
}

#[test]
fn generate_produces_unique_non_empty_ids() {
    let a = SessionId::generate();
    let b = SessionId::generate();
    assert_ne!(a, b);
    assert!(!a.as_str().is_empty());
}

#[test]
fn borrows_as_str_for_map_lookup() {
    use std::collections::HashMap;
    let mut map: HashMap<SessionId, u32> = HashMap::new();
    map.insert(SessionId::new("x"), 1);
    assert_eq!(map.get("x"), Some(&1));
}

#[test]
fn roundtrips_through_json() {
    let id = SessionId::new("sess-1");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"sess-1\"");
    let back: SessionId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
