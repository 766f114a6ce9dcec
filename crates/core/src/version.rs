// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process version stamp persisted with each session record (spec §3
//! `SessionRecord.creatingVersion`) and used to gate endpoint handshakes
//! (spec §3 `SessionRecord.version`, the "protocol generation").

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic-version-shaped stamp. The core never compares or parses this
/// beyond the `Eq`/`Ord` it gets for free — version gating, if any, is the
/// endpoint factory's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ProcessVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for ProcessVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Monotonically-increasing protocol generation a session was created
/// against; passed verbatim to `EndpointFactory::connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolGeneration(pub u32);

impl fmt::Display for ProtocolGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
