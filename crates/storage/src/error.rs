// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence failures (spec §7 "PersistenceError").

use relay_core::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no session record for {0}")]
    NotFound(SessionId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed session record: {0}")]
    Serde(#[from] serde_json::Error),
}
