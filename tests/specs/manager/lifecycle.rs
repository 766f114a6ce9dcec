// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end Manager lifecycle: create a forwarding session through the
//! Manager, pause it, resume it, then shut the Manager down entirely (spec
//! §4.3: "Shutdown is Manager-wide ... the Manager accepts no further
//! operations").

use std::sync::Arc;
use std::time::Duration;

use relay_core::{CoreOptions, Labels, ProcessVersion, ProtocolGeneration};
use relay_manager::{Manager, ManagerError, Selection};
use relay_net::test_support::{FakeConnectResult, FakeEndpoint, FakeEndpointFactory};
use relay_net::{NullPrompter, Orientation};
use relay_storage::RecordStore;
use tokio_util::sync::CancellationToken;

use crate::support;

fn open_manager(store: Arc<RecordStore>, factory: Arc<FakeEndpointFactory>) -> Manager {
    Manager::open(
        store,
        factory,
        relay_core::SystemClock,
        support::protocol_version(),
        ProcessVersion::new(0, 2, 0),
        CoreOptions { auto_reconnect_interval: Duration::from_millis(50), ..Default::default() },
    )
    .expect("open manager")
}

#[tokio::test]
async fn create_pause_resume_then_shutdown_across_the_manager() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());
    let (source, _source_handle) = FakeEndpoint::new(Orientation::Source);
    let (destination, _destination_handle) = FakeEndpoint::new(Orientation::Destination);
    factory.push(FakeConnectResult::Ready(source));
    factory.push(FakeConnectResult::Ready(destination));

    let manager = open_manager(store, factory.clone());

    let controller = manager
        .create(
            CancellationToken::new(),
            "tcp://source".to_string(),
            "tcp://dest".to_string(),
            support::empty_config(),
            support::empty_config(),
            support::empty_config(),
            "example".to_string(),
            CoreOptions { labels: Labels::new(), ..Default::default() },
            &NullPrompter,
        )
        .await
        .expect("create");
    let identifier = controller.record().identifier;

    assert!(support::wait_for(&controller, |s| s.status == relay_controller::Status::ForwardingStreams).await);

    let selection = Selection::Ids(vec![identifier.clone()]);
    let pause_errors = manager.pause(&selection).await.expect("pause");
    assert!(pause_errors.is_empty());
    assert!(manager.list(&selection).expect("list").sessions[0].status == relay_controller::Status::Disconnected);

    let (resumed_source, _resumed_source_handle) = FakeEndpoint::new(Orientation::Source);
    let (resumed_destination, _resumed_destination_handle) = FakeEndpoint::new(Orientation::Destination);
    factory.push(FakeConnectResult::Ready(resumed_source));
    factory.push(FakeConnectResult::Ready(resumed_destination));

    let resume_errors = manager.resume(&selection, &NullPrompter).await.expect("resume");
    assert!(resume_errors.is_empty());
    assert!(support::wait_for(&controller, |s| s.status == relay_controller::Status::ForwardingStreams).await);

    let shutdown_errors = manager.shutdown().await;
    assert!(shutdown_errors.is_empty());

    let result = manager.list(&Selection::All);
    assert!(matches!(result, Err(ManagerError::ShutDown)));
}
