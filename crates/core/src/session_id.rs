// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier: the opaque stable string that names a controller
//! uniquely within a manager (spec §3 `SessionRecord.identifier`).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Length of the random suffix generated by [`SessionId::generate`].
const GENERATED_LEN: usize = 21;

/// Unique identifier for a forwarding session.
///
/// Opaque to the core beyond equality/ordering/hashing: the identifier is
/// never parsed or interpreted, only compared and used as a map key and a
/// filesystem path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Create a SessionId from any string-like value (e.g. a caller-supplied
    /// or persisted identifier).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, randomly-suffixed identifier.
    ///
    /// Used by `Manager::create` when no identifier is supplied by the
    /// caller (spec §4.2 `Create` takes no `identifier` parameter).
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(GENERATED_LEN))
    }

    /// Get the string value of this SessionId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "session_id_tests.rs"]
mod tests;
