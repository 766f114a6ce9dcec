// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent per-session metadata (spec §3 "SessionRecord").

use relay_core::{Labels, MergedConfig, ProcessVersion, ProtocolGeneration, SessionId};
use serde::{Deserialize, Serialize};

/// Immutable except for `paused`. Persisted to disk after every change to
/// `paused` and after creation; removed as the terminal act of
/// `Controller::halt(Terminate)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub identifier: SessionId,
    pub version: ProtocolGeneration,
    /// Monotonic-safe epoch milliseconds at creation (spec §3 "createdAt").
    pub created_at: u64,
    pub creating_version: ProcessVersion,
    /// Opaque endpoint URL, never interpreted by the core.
    pub source: String,
    pub destination: String,
    pub config: MergedConfig,
    pub config_source: MergedConfig,
    pub config_destination: MergedConfig,
    pub name: String,
    pub labels: Labels,
    pub paused: bool,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
