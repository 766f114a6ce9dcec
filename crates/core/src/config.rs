// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shape of the configuration options the core recognizes (spec §6).
//!
//! The core does not parse or merge configuration — that is an external
//! collaborator's job (spec §1 Non-goals) — but it does own the
//! `Deserialize` shape of the handful of options it reads, the same
//! division of labour as `ContainerConfig` in the teacher repo: a plain
//! value type the daemon layer populates from its own merged config.

use crate::labels::Labels;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A merged source/destination configuration (spec §3 `MergedConfig`):
/// derived once at construction, static for the controller's lifetime, and
/// opaque to the core beyond handing it to `EndpointFactory::connect`.
/// `Arc<serde_json::Value>` lets it round-trip through persistence without
/// the core needing a concrete schema for it.
pub type MergedConfig = Arc<serde_json::Value>;

/// Default cooldown between reconnect attempts (spec §6: "≈15 s").
pub const DEFAULT_AUTO_RECONNECT_INTERVAL: Duration = Duration::from_secs(15);

fn default_auto_reconnect_interval() -> Duration {
    DEFAULT_AUTO_RECONNECT_INTERVAL
}

/// Options recognized by the core (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreOptions {
    /// Cooldown between reconnect attempts and between a forward-phase
    /// failure and the next connect attempt (spec §4.2 phases 1 and 3).
    #[serde(with = "duration_secs", default = "default_auto_reconnect_interval")]
    pub auto_reconnect_interval: Duration,
    /// Initial paused state for a newly created session.
    #[serde(default)]
    pub paused: bool,
    /// Initial labels for a newly created session.
    #[serde(default)]
    pub labels: Labels,
}

impl Default for CoreOptions {
    fn default() -> Self {
        Self {
            auto_reconnect_interval: DEFAULT_AUTO_RECONNECT_INTERVAL,
            paused: false,
            labels: Labels::new(),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
