// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Endpoint`]/[`EndpointFactory`] fakes for exercising the
//! controller and manager crates without real transports. Gated behind the
//! `test-support` feature, mirroring how the teacher ships fakes for its
//! storage and transport seams.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{MergedConfig, ProtocolGeneration, SessionId};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::endpoint::{DuplexStream, Endpoint, Orientation, TransportFault};
use crate::error::EndpointError;
use crate::factory::{EndpointFactory, Prompter};

/// A programmable endpoint: streams are fed in by a paired [`FakeEndpointHandle`]
/// and handed out one at a time from `open()`.
pub struct FakeEndpoint {
    orientation: Orientation,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<DuplexStream>>,
    shutdown: CancellationToken,
    fault_rx: Mutex<Option<oneshot::Receiver<TransportFault>>>,
}

/// Controls for a [`FakeEndpoint`], held by the test driving a scenario.
pub struct FakeEndpointHandle {
    streams: mpsc::UnboundedSender<DuplexStream>,
    fault_tx: Mutex<Option<oneshot::Sender<TransportFault>>>,
    shutdown: CancellationToken,
}

impl FakeEndpoint {
    pub fn new(orientation: Orientation) -> (Arc<FakeEndpoint>, FakeEndpointHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (fault_tx, fault_rx) = oneshot::channel();
        let shutdown = CancellationToken::new();
        let endpoint = Arc::new(FakeEndpoint {
            orientation,
            incoming: tokio::sync::Mutex::new(rx),
            shutdown: shutdown.clone(),
            fault_rx: Mutex::new(Some(fault_rx)),
        });
        let handle = FakeEndpointHandle { streams: tx, fault_tx: Mutex::new(Some(fault_tx)), shutdown };
        (endpoint, handle)
    }

    async fn open(&self) -> Result<DuplexStream, EndpointError> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(EndpointError::ShutDown),
            next = async { self.incoming.lock().await.recv().await } => {
                next.ok_or(EndpointError::ShutDown)
            }
        }
    }

    fn transport_errors(&self) -> oneshot::Receiver<TransportFault> {
        if let Some(rx) = self.fault_rx.lock().take() {
            rx
        } else {
            let (_tx, rx) = oneshot::channel();
            rx
        }
    }

    fn shutdown_now(&self) {
        self.shutdown.cancel();
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}

impl FakeEndpointHandle {
    /// Queue a stream to be returned by the next `open()` call.
    pub fn push_stream(&self, stream: DuplexStream) {
        let _ = self.streams.send(stream);
    }

    /// Raise a transport fault on the paired endpoint's `transport_errors` channel.
    pub fn fire_transport_fault(&self, fault: TransportFault) {
        if let Some(tx) = self.fault_tx.lock().take() {
            let _ = tx.send(fault);
        }
    }

    /// Shut the paired endpoint down as if the transport had been told to close.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl Endpoint for Arc<FakeEndpoint> {
    async fn open(&self) -> Result<DuplexStream, EndpointError> {
        FakeEndpoint::open(self).await
    }

    fn transport_errors(&self) -> oneshot::Receiver<TransportFault> {
        FakeEndpoint::transport_errors(self)
    }

    fn shutdown(&self) {
        FakeEndpoint::shutdown_now(self)
    }

    fn orientation(&self) -> Orientation {
        FakeEndpoint::orientation(self)
    }
}

/// One scripted outcome for a [`FakeEndpointFactory::connect`] call.
pub enum FakeConnectResult {
    Ready(Arc<FakeEndpoint>),
    Fail(EndpointError),
}

/// An [`EndpointFactory`] whose `connect` calls are scripted in advance, so
/// tests can drive reconnect and backoff scenarios deterministically.
#[derive(Default)]
pub struct FakeEndpointFactory {
    script: Mutex<VecDeque<FakeConnectResult>>,
}

impl FakeEndpointFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome to the back of the script.
    pub fn push(&self, result: FakeConnectResult) {
        self.script.lock().push_back(result);
    }
}

#[async_trait]
impl EndpointFactory for FakeEndpointFactory {
    async fn connect(
        &self,
        ctx: CancellationToken,
        _url: &str,
        _prompter: &dyn Prompter,
        _session_id: &SessionId,
        _version: ProtocolGeneration,
        _config: MergedConfig,
        _orientation: Orientation,
    ) -> Result<Box<dyn Endpoint>, EndpointError> {
        if ctx.is_cancelled() {
            return Err(EndpointError::Cancelled);
        }
        match self.script.lock().pop_front() {
            Some(FakeConnectResult::Ready(endpoint)) => Ok(Box::new(endpoint)),
            Some(FakeConnectResult::Fail(err)) => Err(err),
            None => Err(EndpointError::ShutDown),
        }
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
