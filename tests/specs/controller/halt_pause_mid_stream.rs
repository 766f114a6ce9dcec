// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 5: pausing a forwarding session with one open stream tears the
//! supervisor down, persists `paused`, and leaves `openStreams` at zero.

use std::sync::Arc;

use relay_controller::{HaltMode, Status};
use relay_net::test_support::{FakeConnectResult, FakeEndpoint, FakeEndpointFactory};
use relay_net::Orientation;
use tokio::io::duplex;

use crate::support;

#[tokio::test]
async fn halt_pause_while_forwarding_closes_the_open_stream_and_persists_paused() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());

    let (source, source_handle) = FakeEndpoint::new(Orientation::Source);
    let (destination, destination_handle) = FakeEndpoint::new(Orientation::Destination);
    factory.push(FakeConnectResult::Ready(source));
    factory.push(FakeConnectResult::Ready(destination));

    let controller =
        support::create_controller(store.clone(), factory, "tcp://source", "tcp://dest", "example", Default::default(), false)
            .await
            .expect("create");

    assert!(support::wait_for(&controller, |s| s.status == Status::ForwardingStreams).await);

    let (inbound_near, inbound_far) = duplex(1024);
    let (outbound_near, outbound_far) = duplex(1024);
    source_handle.push_stream(Box::pin(inbound_near));
    destination_handle.push_stream(Box::pin(outbound_near));

    assert!(support::wait_for(&controller, |s| s.open_streams == 1).await, "expected the stream to be paired");

    controller.halt(HaltMode::Pause).await.expect("halt pause");

    let identifier = controller.snapshot().identifier;
    let persisted = store.load(&identifier).expect("load persisted record");
    assert!(persisted.paused);
    assert_eq!(controller.snapshot().open_streams, 0, "halt must wait for the supervisor, which tore the stream down");

    // Both ends of the spliced pair must have been shut down: writes on
    // either side now fail or read as EOF since the splicer closed them.
    drop(inbound_far);
    drop(outbound_far);
}
