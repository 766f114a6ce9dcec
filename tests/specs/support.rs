// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scaffolding for the workspace-level integration tests.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{CoreOptions, Labels, MergedConfig, ProcessVersion, ProtocolGeneration};
use relay_controller::{Controller, StateSnapshot};
use relay_net::test_support::FakeEndpointFactory;
use relay_net::NullPrompter;
use relay_storage::RecordStore;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const AUTO_RECONNECT_INTERVAL: Duration = Duration::from_secs(15);

pub fn protocol_version() -> ProtocolGeneration {
    ProtocolGeneration(1)
}

pub fn creating_version() -> ProcessVersion {
    ProcessVersion::new(0, 2, 0)
}

pub fn empty_config() -> MergedConfig {
    Arc::new(serde_json::json!({}))
}

pub fn record_store() -> (TempDir, Arc<RecordStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(RecordStore::new(dir.path()).expect("open record store"));
    (dir, store)
}

#[allow(clippy::too_many_arguments)]
pub async fn create_controller(
    store: Arc<RecordStore>,
    factory: Arc<FakeEndpointFactory>,
    source: &str,
    destination: &str,
    name: &str,
    labels: Labels,
    paused: bool,
) -> Result<Arc<Controller>, relay_controller::ControllerError> {
    Controller::create(
        CancellationToken::new(),
        store,
        factory,
        1_700_000_000_000,
        protocol_version(),
        creating_version(),
        source.to_string(),
        destination.to_string(),
        empty_config(),
        empty_config(),
        empty_config(),
        name.to_string(),
        CoreOptions { auto_reconnect_interval: AUTO_RECONNECT_INTERVAL, paused, labels },
        &NullPrompter,
    )
    .await
}

/// Poll `controller.snapshot()` until `predicate` holds or the budget of
/// real-time polls is exhausted.
pub async fn wait_for(controller: &Arc<Controller>, predicate: impl Fn(&StateSnapshot) -> bool) -> bool {
    for _ in 0..200 {
        if predicate(&controller.snapshot()) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
