// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session supervisor (spec §4.2 "Controller").

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use relay_core::{CoreOptions, MergedConfig, ProcessVersion, ProtocolGeneration, SessionId};
use relay_net::{Endpoint, EndpointError, EndpointFactory, NullPrompter, Orientation, Prompter, SpliceObserver};
use relay_storage::{RecordStore, SessionRecord};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ControllerError;
use crate::snapshot::{SnapshotCounters, StateCell, StateSnapshot};
use crate::status::Status;

/// `Halt` modes (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltMode {
    Pause,
    Shutdown,
    Terminate,
}

#[derive(Default)]
struct Lifecycle {
    disabled: bool,
    cancel: Option<CancellationToken>,
    supervisor_done: Option<oneshot::Receiver<()>>,
}

/// Per-session supervisor: owns endpoints, runs the connect/forward/recover
/// loop, exposes observable state, and services lifecycle commands (spec
/// §4.2). Always held behind an `Arc` since the supervisor task shares
/// ownership with its `Controller`.
pub struct Controller {
    state: StateCell,
    lifecycle: Mutex<Lifecycle>,
    store: Arc<RecordStore>,
    factory: Arc<dyn EndpointFactory>,
    protocol_version: ProtocolGeneration,
    auto_reconnect_interval: Duration,
}

enum ForwardExit {
    Cancelled,
    Failed(String),
}

/// Cancellation surfaces as its own error value rather than being folded
/// into `SourceConnect`/`DestinationConnect` (spec §7).
fn classify_connect_error(err: EndpointError, orientation: Orientation) -> ControllerError {
    if matches!(err, EndpointError::Cancelled) {
        return ControllerError::Cancelled;
    }
    match orientation {
        Orientation::Source => ControllerError::SourceConnect(err),
        Orientation::Destination => ControllerError::DestinationConnect(err),
    }
}

impl Controller {
    /// Build and persist a new session, optionally connecting it
    /// immediately (spec §4.2 `Create`).
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        ctx: CancellationToken,
        store: Arc<RecordStore>,
        factory: Arc<dyn EndpointFactory>,
        created_at_ms: u64,
        protocol_version: ProtocolGeneration,
        creating_version: ProcessVersion,
        source: String,
        destination: String,
        config: MergedConfig,
        config_source: MergedConfig,
        config_destination: MergedConfig,
        name: String,
        options: CoreOptions,
        prompter: &dyn Prompter,
    ) -> Result<Arc<Controller>, ControllerError> {
        let CoreOptions { auto_reconnect_interval, paused, labels } = options;
        let identifier = SessionId::generate();

        let mut source_endpoint: Option<Box<dyn Endpoint>> = None;
        let mut destination_endpoint: Option<Box<dyn Endpoint>> = None;

        if !paused {
            let endpoint = factory
                .connect(
                    ctx.clone(),
                    &source,
                    prompter,
                    &identifier,
                    protocol_version,
                    config_source.clone(),
                    Orientation::Source,
                )
                .await
                .map_err(|err| classify_connect_error(err, Orientation::Source))?;
            source_endpoint = Some(endpoint);

            match factory
                .connect(
                    ctx.clone(),
                    &destination,
                    prompter,
                    &identifier,
                    protocol_version,
                    config_destination.clone(),
                    Orientation::Destination,
                )
                .await
            {
                Ok(endpoint) => destination_endpoint = Some(endpoint),
                Err(err) => {
                    warn!(session_id = %identifier, error = %err, "destination connect failed during create, shutting down source");
                    if let Some(source) = source_endpoint.take() {
                        source.shutdown();
                    }
                    return Err(classify_connect_error(err, Orientation::Destination));
                }
            }
        }

        let record = SessionRecord {
            identifier,
            version: protocol_version,
            created_at: created_at_ms,
            creating_version,
            source,
            destination,
            config,
            config_source,
            config_destination,
            name,
            labels,
            paused,
        };
        store.save(&record)?;
        info!(session_id = %identifier, paused, "session created");

        let (state, _changed) = StateCell::new(record);
        let controller = Arc::new(Controller {
            state,
            lifecycle: Mutex::new(Lifecycle::default()),
            store,
            factory,
            protocol_version,
            auto_reconnect_interval,
        });

        if !paused {
            controller.spawn_supervisor(source_endpoint, destination_endpoint);
        }

        Ok(controller)
    }

    /// Reload a persisted session (spec §4.2 `Load`). The supervisor, if
    /// not paused, connects fresh on entry.
    pub fn load(
        store: Arc<RecordStore>,
        factory: Arc<dyn EndpointFactory>,
        identifier: &SessionId,
        protocol_version: ProtocolGeneration,
        auto_reconnect_interval: Duration,
    ) -> Result<Arc<Controller>, ControllerError> {
        let record = store.load(identifier)?;
        let paused = record.paused;
        info!(session_id = %identifier, paused, "session loaded from disk");
        let (state, _changed) = StateCell::new(record);
        let controller = Arc::new(Controller {
            state,
            lifecycle: Mutex::new(Lifecycle::default()),
            store,
            factory,
            protocol_version,
            auto_reconnect_interval,
        });
        if !paused {
            controller.spawn_supervisor(None, None);
        }
        Ok(controller)
    }

    /// Shallow copy of the published state, taken without firing the
    /// change notification (spec §4.2 `Snapshot`).
    pub fn snapshot(&self) -> StateSnapshot {
        self.state.snapshot()
    }

    /// Subscribe to change notifications, for long-polling clients (spec §4.3).
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<()> {
        self.state.subscribe()
    }

    /// Read-only copy of the persisted record, e.g. for label-selection
    /// lookups by a `relay-manager` (spec §4.3).
    pub fn record(&self) -> SessionRecord {
        self.state.record()
    }

    pub fn is_disabled(&self) -> bool {
        self.lifecycle.lock().disabled
    }

    /// Resume a paused or disconnected session (spec §4.2 `Resume`).
    pub async fn resume(self: &Arc<Self>, ctx: CancellationToken, prompter: &dyn Prompter) -> Result<(), ControllerError> {
        let identifier = self.state.snapshot().identifier;
        info!(session_id = %identifier, "resume requested");
        {
            let lifecycle = self.lifecycle.lock();
            if lifecycle.disabled {
                return Err(ControllerError::Disabled);
            }
            if lifecycle.cancel.is_some() && self.state.snapshot().status.is_healthy() {
                return Ok(());
            }
        }

        self.stop_supervisor_if_running().await;

        let record = self.state.set_paused(false);
        let persistence_result = self.store.save(&record);

        let source_result = self
            .factory
            .connect(
                ctx.clone(),
                &record.source,
                prompter,
                &record.identifier,
                self.protocol_version,
                record.config_source.clone(),
                Orientation::Source,
            )
            .await;
        let (source_endpoint, source_connect_error) = match source_result {
            Ok(endpoint) => {
                self.state.set_source_connected(true);
                (Some(endpoint), None)
            }
            Err(err) => {
                self.state.set_source_connected(false);
                self.state.record_error(format!("source connect: {err}"));
                (None, Some(classify_connect_error(err, Orientation::Source)))
            }
        };

        let destination_result = self
            .factory
            .connect(
                ctx.clone(),
                &record.destination,
                prompter,
                &record.identifier,
                self.protocol_version,
                record.config_destination.clone(),
                Orientation::Destination,
            )
            .await;
        let (destination_endpoint, destination_connect_error) = match destination_result {
            Ok(endpoint) => {
                self.state.set_destination_connected(true);
                (Some(endpoint), None)
            }
            Err(err) => {
                self.state.set_destination_connected(false);
                self.state.record_error(format!("destination connect: {err}"));
                (None, Some(classify_connect_error(err, Orientation::Destination)))
            }
        };

        self.spawn_supervisor(source_endpoint, destination_endpoint);

        // Surface the first non-nil among (persistence error, source
        // connect error, destination connect error) — spec §4.2 `Resume`
        // step 7. Connect failures are non-fatal; the supervisor retries
        // regardless of what is returned here.
        if let Err(err) = persistence_result {
            return Err(ControllerError::Persistence(err));
        }
        if let Some(err) = source_connect_error {
            return Err(err);
        }
        if let Some(err) = destination_connect_error {
            return Err(err);
        }
        Ok(())
    }

    /// Force the in-memory record to disk, independent of any lifecycle
    /// transition (spec §4.3 `Manager.Flush`).
    pub async fn flush(&self) -> Result<(), ControllerError> {
        let record = self.state.record();
        self.store.save(&record)?;
        Ok(())
    }

    /// Pause, shut down, or terminate this session (spec §4.2 `Halt`).
    pub async fn halt(self: &Arc<Self>, mode: HaltMode) -> Result<(), ControllerError> {
        let identifier = self.state.snapshot().identifier;
        info!(session_id = %identifier, ?mode, "halt requested");
        {
            let lifecycle = self.lifecycle.lock();
            if lifecycle.disabled {
                return Err(ControllerError::Disabled);
            }
        }

        self.stop_supervisor_if_running().await;

        match mode {
            HaltMode::Pause => {
                let record = self.state.set_paused(true);
                self.store.save(&record)?;
                Ok(())
            }
            HaltMode::Shutdown => {
                self.lifecycle.lock().disabled = true;
                Ok(())
            }
            HaltMode::Terminate => {
                self.lifecycle.lock().disabled = true;
                self.store.remove(&identifier)?;
                Ok(())
            }
        }
    }

    async fn stop_supervisor_if_running(&self) {
        let (cancel, done) = {
            let mut lifecycle = self.lifecycle.lock();
            (lifecycle.cancel.take(), lifecycle.supervisor_done.take())
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(done) = done {
            let _ = done.await;
        }
    }

    fn spawn_supervisor(self: &Arc<Self>, source: Option<Box<dyn Endpoint>>, destination: Option<Box<dyn Endpoint>>) {
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.cancel = Some(cancel.clone());
            lifecycle.supervisor_done = Some(done_rx);
        }
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_supervisor(cancel, source, destination).await;
            let _ = done_tx.send(());
        });
    }

    /// The connect/forward/cooldown loop (spec §4.2 "Supervisor task").
    async fn run_supervisor(
        self: Arc<Self>,
        ctx: CancellationToken,
        mut source: Option<Box<dyn Endpoint>>,
        mut destination: Option<Box<dyn Endpoint>>,
    ) {
        loop {
            if ctx.is_cancelled() {
                shutdown_held(source, destination);
                break;
            }

            if source.is_none() {
                self.state.set_connecting(Status::ConnectingSource);
                match self.connect_endpoint(&ctx, Orientation::Source).await {
                    Ok(endpoint) => {
                        source = Some(endpoint);
                        self.state.set_source_connected(true);
                    }
                    Err(err) => {
                        self.state.set_source_connected(false);
                        self.state.record_error(format!("source connect: {err}"));
                        warn!(error = %err, "source connect attempt failed, will retry");
                    }
                }
            }
            if ctx.is_cancelled() {
                shutdown_held(source, destination);
                break;
            }

            if destination.is_none() {
                self.state.set_connecting(Status::ConnectingDestination);
                match self.connect_endpoint(&ctx, Orientation::Destination).await {
                    Ok(endpoint) => {
                        destination = Some(endpoint);
                        self.state.set_destination_connected(true);
                    }
                    Err(err) => {
                        self.state.set_destination_connected(false);
                        self.state.record_error(format!("destination connect: {err}"));
                        warn!(error = %err, "destination connect attempt failed, will retry");
                    }
                }
            }
            if ctx.is_cancelled() {
                shutdown_held(source, destination);
                break;
            }

            let (ready_source, ready_destination) = (source.take(), destination.take());
            let (src, dst) = match (ready_source, ready_destination) {
                (Some(src), Some(dst)) => (src, dst),
                (leftover_source, leftover_destination) => {
                    source = leftover_source;
                    destination = leftover_destination;
                    if sleep_cancellable(&ctx, self.auto_reconnect_interval).await.is_cancelled() {
                        shutdown_held(source, destination);
                        break;
                    }
                    continue;
                }
            };

            let identifier = self.state.record().identifier;
            info!(session_id = %identifier, "forward phase entered");
            let failure_started_at = Instant::now();
            match self.forward(&ctx, src, dst).await {
                ForwardExit::Cancelled => {
                    self.state.reset_to_fresh(String::new());
                    break;
                }
                ForwardExit::Failed(message) => {
                    warn!(session_id = %identifier, error = %message, "forward phase unwound");
                    self.state.reset_to_fresh(message);
                }
            }

            let elapsed = failure_started_at.elapsed();
            if elapsed < self.auto_reconnect_interval
                && sleep_cancellable(&ctx, self.auto_reconnect_interval - elapsed).await.is_cancelled()
            {
                break;
            }
        }
    }

    async fn connect_endpoint(
        &self,
        ctx: &CancellationToken,
        orientation: Orientation,
    ) -> Result<Box<dyn Endpoint>, EndpointError> {
        let record = self.state.record();
        let (url, config) = match orientation {
            Orientation::Source => (record.source.clone(), record.config_source.clone()),
            Orientation::Destination => (record.destination.clone(), record.config_destination.clone()),
        };
        self.factory
            .connect(ctx.clone(), &url, &NullPrompter, &record.identifier, self.protocol_version, config, orientation)
            .await
    }

    /// One forward phase: splice streams until a transport fault, forward
    /// error, or cancellation unwinds it (spec §4.2 step 2).
    async fn forward(
        self: &Arc<Self>,
        ctx: &CancellationToken,
        source: Box<dyn Endpoint>,
        destination: Box<dyn Endpoint>,
    ) -> ForwardExit {
        let source: Arc<dyn Endpoint> = Arc::from(source);
        let destination: Arc<dyn Endpoint> = Arc::from(destination);

        let mut source_faults = source.transport_errors();
        let mut destination_faults = destination.transport_errors();

        let counters = self.state.enter_forward_phase();

        let forward_ctx = ctx.child_token();

        let accept_source = source.clone();
        let accept_destination = destination.clone();
        let accept_ctx = forward_ctx.clone();
        let accept_counters = counters.clone();
        let mut forward_loop =
            tokio::spawn(async move { accept_splice_loop(accept_ctx, accept_source, accept_destination, accept_counters).await });

        let shutdown_source = source.clone();
        let shutdown_destination = destination.clone();
        let shutdown_ctx = forward_ctx.clone();
        let scoped_shutdown = tokio::spawn(async move {
            shutdown_ctx.cancelled().await;
            shutdown_source.shutdown();
            shutdown_destination.shutdown();
        });

        enum Winner {
            Cancelled,
            SourceFault(String),
            DestinationFault(String),
            ForwardLoop(Result<Result<(), String>, tokio::task::JoinError>),
        }

        let winner = tokio::select! {
            _ = ctx.cancelled() => Winner::Cancelled,
            fault = &mut source_faults => Winner::SourceFault(fault_message(fault)),
            fault = &mut destination_faults => Winner::DestinationFault(fault_message(fault)),
            result = &mut forward_loop => Winner::ForwardLoop(result),
        };

        forward_ctx.cancel();
        let _ = scoped_shutdown.await;

        match winner {
            Winner::Cancelled => {
                let _ = forward_loop.await;
                ForwardExit::Cancelled
            }
            Winner::SourceFault(message) => {
                let _ = forward_loop.await;
                ForwardExit::Failed(format!("source transport failure: {message}"))
            }
            Winner::DestinationFault(message) => {
                let _ = forward_loop.await;
                ForwardExit::Failed(format!("destination transport failure: {message}"))
            }
            Winner::ForwardLoop(Ok(Ok(()))) => ForwardExit::Failed("forward loop ended unexpectedly".to_string()),
            Winner::ForwardLoop(Ok(Err(message))) => ForwardExit::Failed(message),
            Winner::ForwardLoop(Err(_join_error)) => ForwardExit::Failed("forward loop task failed".to_string()),
        }
    }
}

fn shutdown_held(source: Option<Box<dyn Endpoint>>, destination: Option<Box<dyn Endpoint>>) {
    if let Some(endpoint) = source {
        endpoint.shutdown();
    }
    if let Some(endpoint) = destination {
        endpoint.shutdown();
    }
}

enum SleepOutcome {
    Completed,
    Cancelled,
}

impl SleepOutcome {
    fn is_cancelled(&self) -> bool {
        matches!(self, SleepOutcome::Cancelled)
    }
}

async fn sleep_cancellable(ctx: &CancellationToken, duration: Duration) -> SleepOutcome {
    tokio::select! {
        _ = ctx.cancelled() => SleepOutcome::Cancelled,
        _ = tokio::time::sleep(duration) => SleepOutcome::Completed,
    }
}

fn fault_message(result: Result<relay_net::TransportFault, oneshot::error::RecvError>) -> String {
    match result {
        Ok(fault) => fault.0,
        Err(_) => "transport channel closed".to_string(),
    }
}

/// The accept/splice inner loop (spec §4.2 step 2 pseudocode): accept an
/// inbound stream, dial an outbound stream, and spawn a splicer for the
/// pair. `totalStreams` is only bumped once both sides of a pair succeed
/// (spec §9 "open question").
async fn accept_splice_loop(
    ctx: CancellationToken,
    source: Arc<dyn Endpoint>,
    destination: Arc<dyn Endpoint>,
    counters: Arc<SnapshotCounters>,
) -> Result<(), String> {
    loop {
        let inbound = source.open().await.map_err(|err| format!("source open: {err}"))?;
        let outbound = match destination.open().await {
            Ok(stream) => stream,
            Err(err) => {
                drop(inbound);
                return Err(format!("destination open: {err}"));
            }
        };

        // total_streams first: a concurrent snapshot() must never observe
        // open_streams > total_streams.
        counters.total_streams.fetch_add(1, Ordering::Relaxed);
        counters.open_streams.fetch_add(1, Ordering::Relaxed);

        let splice_ctx = ctx.clone();
        let splice_counters = counters.clone();
        tokio::spawn(async move {
            let observer: Arc<dyn SpliceObserver> = Arc::new(CounterObserver(splice_counters.clone()));
            let _ = relay_net::splice(splice_ctx, inbound, outbound, observer).await;
            splice_counters.open_streams.fetch_sub(1, Ordering::Relaxed);
        });
    }
}

struct CounterObserver(Arc<SnapshotCounters>);

impl SpliceObserver for CounterObserver {
    fn on_outbound_bytes(&self, n: u64) {
        self.0.bytes_outbound.fetch_add(n, Ordering::Relaxed);
    }

    fn on_inbound_bytes(&self, n: u64) {
        self.0.bytes_inbound.fetch_add(n, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
