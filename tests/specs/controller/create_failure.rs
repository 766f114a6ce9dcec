// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario 1: a failing source construction never persists a record and
//! leaves the session `Disconnected`.

use std::sync::Arc;

use relay_controller::ControllerError;
use relay_net::test_support::{FakeConnectResult, FakeEndpointFactory};
use relay_net::EndpointError;

use crate::support;

#[tokio::test]
async fn source_construction_failure_leaves_no_record() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());
    factory.push(FakeConnectResult::Fail(EndpointError::Dial("connection refused".to_string())));

    let result =
        support::create_controller(store.clone(), factory, "tcp://source", "tcp://dest", "example", Default::default(), false)
            .await;

    match result {
        Err(ControllerError::SourceConnect(cause)) => {
            assert_eq!(cause.to_string(), "connection refused");
        }
        other => panic!("expected a SourceConnect error, got {other:?}"),
    }
    assert!(store.list_identifiers().expect("list identifiers").is_empty());
}

#[tokio::test]
async fn destination_construction_failure_shuts_down_source_and_leaves_no_record() {
    let (_dir, store) = support::record_store();
    let factory = Arc::new(FakeEndpointFactory::new());
    let (source_endpoint, _source_handle) = relay_net::test_support::FakeEndpoint::new(relay_net::Orientation::Source);
    factory.push(FakeConnectResult::Ready(source_endpoint));
    factory.push(FakeConnectResult::Fail(EndpointError::Dial("destination unreachable".to_string())));

    let result =
        support::create_controller(store.clone(), factory, "tcp://source", "tcp://dest", "example", Default::default(), false)
            .await;

    assert!(matches!(result, Err(ControllerError::DestinationConnect(_))));
    assert!(store.list_identifiers().expect("list identifiers").is_empty());
}
