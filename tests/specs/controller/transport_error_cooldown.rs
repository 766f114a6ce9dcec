// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 3: a transport fault on a forwarding session unwinds the
//! forward phase, publishes `lastError`, and reconnects after cooldown.

use std::sync::Arc;
use std::time::Duration;

use relay_controller::Status;
use relay_core::CoreOptions;
use relay_net::test_support::{FakeConnectResult, FakeEndpoint, FakeEndpointFactory};
use relay_net::{Orientation, TransportFault};

use crate::support;

const COOLDOWN: Duration = Duration::from_millis(60);

#[tokio::test]
async fn transport_fault_unwinds_then_reconnects_after_cooldown() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());

    let (first_source, first_source_handle) = FakeEndpoint::new(Orientation::Source);
    let (first_destination, _first_destination_handle) = FakeEndpoint::new(Orientation::Destination);
    factory.push(FakeConnectResult::Ready(first_source));
    factory.push(FakeConnectResult::Ready(first_destination));

    let (second_source, _second_source_handle) = FakeEndpoint::new(Orientation::Source);
    let (second_destination, _second_destination_handle) = FakeEndpoint::new(Orientation::Destination);
    factory.push(FakeConnectResult::Ready(second_source));
    factory.push(FakeConnectResult::Ready(second_destination));

    let controller = relay_controller::Controller::create(
        tokio_util::sync::CancellationToken::new(),
        store,
        factory,
        1_700_000_000_000,
        support::protocol_version(),
        support::creating_version(),
        "tcp://source".to_string(),
        "tcp://dest".to_string(),
        support::empty_config(),
        support::empty_config(),
        support::empty_config(),
        "example".to_string(),
        CoreOptions { auto_reconnect_interval: COOLDOWN, ..Default::default() },
        &relay_net::NullPrompter,
    )
    .await
    .expect("create");

    assert!(support::wait_for(&controller, |s| s.status == Status::ForwardingStreams).await, "expected first forward phase");

    first_source_handle.fire_transport_fault(TransportFault("keepalive timed out".to_string()));

    assert!(
        support::wait_for(&controller, |s| s.status != Status::ForwardingStreams
            && s.last_error.contains("source transport failure"))
        .await,
        "expected the fault to unwind the forward phase and publish lastError"
    );

    // Cooldown has not elapsed yet: still not forwarding.
    let snapshot = controller.snapshot();
    assert_ne!(snapshot.status, Status::ForwardingStreams);

    assert!(
        support::wait_for(&controller, |s| s.status == Status::ForwardingStreams).await,
        "expected reconnect to succeed after cooldown"
    );
}
