// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 4: opening a stream and sending bytes across it moves the
//! snapshot counters; closing it returns `openStreams` to zero while
//! `totalStreams` stays put.

use std::sync::Arc;

use relay_controller::Status;
use relay_net::test_support::{FakeConnectResult, FakeEndpoint, FakeEndpointFactory};
use relay_net::Orientation;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

use crate::support;

#[tokio::test]
async fn byte_counters_and_stream_counts_track_one_open_then_closed_stream() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());

    let (source, source_handle) = FakeEndpoint::new(Orientation::Source);
    let (destination, destination_handle) = FakeEndpoint::new(Orientation::Destination);
    factory.push(FakeConnectResult::Ready(source));
    factory.push(FakeConnectResult::Ready(destination));

    let controller =
        support::create_controller(store, factory, "tcp://source", "tcp://dest", "example", Default::default(), false)
            .await
            .expect("create");

    assert!(support::wait_for(&controller, |s| s.status == Status::ForwardingStreams).await);

    let (inbound_near, mut inbound_far) = duplex(1024);
    let (outbound_near, mut outbound_far) = duplex(1024);
    source_handle.push_stream(Box::pin(inbound_near));
    destination_handle.push_stream(Box::pin(outbound_near));

    assert!(support::wait_for(&controller, |s| s.open_streams == 1 && s.total_streams == 1).await, "expected one paired stream");

    inbound_far.write_all(&[0u8; 100]).await.expect("write 100 bytes source-side");

    let mut received = [0u8; 100];
    outbound_far.read_exact(&mut received).await.expect("destination side receives the bytes");

    assert!(support::wait_for(&controller, |s| s.bytes_outbound >= 100).await);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.open_streams, 1);
    assert_eq!(snapshot.total_streams, 1);

    drop(inbound_far);
    drop(outbound_far);

    assert!(support::wait_for(&controller, |s| s.open_streams == 0).await, "expected open_streams to drop after close");
    assert_eq!(controller.snapshot().total_streams, 1);
}
