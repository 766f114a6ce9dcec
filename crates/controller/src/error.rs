// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller-level failures (spec §7).

use relay_net::EndpointError;
use relay_storage::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("unable to connect to source: {0}")]
    SourceConnect(#[source] EndpointError),
    #[error("unable to connect to destination: {0}")]
    DestinationConnect(#[source] EndpointError),
    #[error("session is disabled")]
    Disabled,
    #[error("session cancelled")]
    Cancelled,
    #[error("persistence error: {0}")]
    Persistence(#[from] RecordError),
}
