// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for endpoint construction and use (spec §7).

use thiserror::Error;

/// Failure constructing or using an [`crate::endpoint::Endpoint`].
///
/// The same type serves both `EndpointFactory::connect` (a
/// *ConstructionError* per spec §7: not fatal, the supervisor retries after
/// cooldown) and `Endpoint::open` (a *ForwardError* per spec §7: unwinds the
/// current forward phase exactly like a transport error). Callers decide
/// which policy applies based on which phase they're in, not on the error
/// variant.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("{0}")]
    Dial(String),
    #[error("construction cancelled")]
    Cancelled,
    #[error("endpoint shut down")]
    ShutDown,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
