// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 2: a paused session round-trips through persistence with no
//! `StateSnapshot` fields populated beyond identity.

use std::sync::Arc;
use std::time::Duration;

use relay_controller::{Controller, Status};
use relay_net::test_support::FakeEndpointFactory;

use crate::support;

#[tokio::test]
async fn create_paused_then_load_yields_identity_only_snapshot() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());

    let mut labels = relay_core::Labels::new();
    labels.insert("env".to_string(), "test".to_string());

    let controller =
        support::create_controller(store.clone(), factory.clone(), "tcp://source", "tcp://dest", "example", labels.clone(), true)
            .await
            .expect("create paused");
    let identifier = controller.snapshot().identifier;

    let reloaded = Controller::load(store, factory, &identifier, support::protocol_version(), support::AUTO_RECONNECT_INTERVAL)
        .expect("load persisted session");
    let snapshot = reloaded.snapshot();
    let record = reloaded.record();

    assert_eq!(snapshot.identifier, identifier);
    assert_eq!(snapshot.status, Status::Disconnected);
    assert_eq!(snapshot.last_error, "");
    assert!(!snapshot.source_connected);
    assert!(!snapshot.destination_connected);
    assert_eq!(snapshot.open_streams, 0);
    assert_eq!(snapshot.total_streams, 0);

    assert!(record.paused);
    assert_eq!(record.labels, labels);

    // paused: no supervisor runs, so no further transitions ever happen.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(reloaded.snapshot().status, Status::Disconnected);
}
