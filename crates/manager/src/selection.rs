// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Selection sets a lifecycle operation applies to (spec §4.3).

use relay_core::{Labels, SessionId};

/// Identifies the sessions a `Manager` operation should act on.
///
/// Dispatched the way `oj-daemon`'s listener dispatches `Request` variants:
/// one match arm per selection kind, no trait objects needed.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Exactly the named sessions; unknown identifiers are silently skipped.
    Ids(Vec<SessionId>),
    /// Every session whose labels are a superset of the predicate.
    Labels(Labels),
    /// Every session the Manager knows about.
    All,
}
