// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Label mapping attached to a session (spec §3: "a mapping from string keys
//! to string values, keys unique, insertion order irrelevant").

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `BTreeMap` gives the uniqueness and order-independence spec §3 asks
/// for, plus deterministic serialization, without pulling in a dedicated
/// ordered-map dependency for a handful of strings.
pub type Labels = BTreeMap<String, String>;

/// Whether `labels` satisfies a label-selection predicate: every key/value
/// pair in `predicate` must be present with an equal value in `labels`.
///
/// An empty predicate matches every session (consistent with treating
/// `Selection::Labels(BTreeMap::new())` as a no-op filter rather than a
/// match-nothing filter).
pub fn matches(labels: &Labels, predicate: &Labels) -> bool {
    predicate.iter().all(|(k, v)| labels.get(k) == Some(v))
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
