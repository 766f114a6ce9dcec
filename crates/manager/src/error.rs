// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manager-level failures (spec §7).

use relay_controller::ControllerError;
use relay_storage::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("manager has shut down and accepts no further operations")]
    ShutDown,
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Record(#[from] RecordError),
}
