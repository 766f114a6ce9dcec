// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of controllers; dispatches lifecycle operations across a
//! selection set; reloads controllers from disk on startup (spec §4.3).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use relay_controller::{Controller, HaltMode, StateSnapshot};
use relay_core::{Clock, CoreOptions, MergedConfig, ProcessVersion, ProtocolGeneration, SessionId, SystemClock};
use relay_net::{EndpointFactory, Prompter};
use relay_storage::RecordStore;
use tokio_util::sync::CancellationToken;

use crate::error::ManagerError;
use crate::selection::Selection;

/// A `List` result: the change-tracker index observed at the moment of the
/// call, paired with a snapshot per matched session (spec §4.3: "clients
/// can long-poll by passing back the index").
#[derive(Debug, Clone)]
pub struct ListResult {
    pub change_index: u64,
    pub sessions: Vec<StateSnapshot>,
}

/// Registry of `Controller`s, keyed by session identifier.
///
/// Generic over [`Clock`] so tests can substitute a `relay_core::FakeClock`
/// for the timestamp stamped on newly created sessions; defaults to
/// [`SystemClock`] for production use.
pub struct Manager<C: Clock = SystemClock> {
    controllers: RwLock<HashMap<SessionId, Arc<Controller>>>,
    change_index: Arc<AtomicU64>,
    store: Arc<RecordStore>,
    factory: Arc<dyn EndpointFactory>,
    clock: C,
    protocol_version: ProtocolGeneration,
    creating_version: ProcessVersion,
    auto_reconnect_interval: Duration,
    shut_down: AtomicBool,
}

impl<C: Clock> Manager<C> {
    /// Open a Manager rooted at `store`, reloading every persisted session
    /// via [`Controller::load`] (spec §4.3 "On startup it enumerates
    /// persisted records"). `default_options` supplies the Manager-wide
    /// `auto_reconnect_interval` applied to every controller it owns (spec
    /// §6); its `paused`/`labels` fields are per-session and apply only at
    /// `create` time, not here.
    pub fn open(
        store: Arc<RecordStore>,
        factory: Arc<dyn EndpointFactory>,
        clock: C,
        protocol_version: ProtocolGeneration,
        creating_version: ProcessVersion,
        default_options: CoreOptions,
    ) -> Result<Self, ManagerError> {
        let manager = Self {
            controllers: RwLock::new(HashMap::new()),
            change_index: Arc::new(AtomicU64::new(0)),
            store,
            factory,
            clock,
            protocol_version,
            creating_version,
            auto_reconnect_interval: default_options.auto_reconnect_interval,
            shut_down: AtomicBool::new(false),
        };
        manager.reload()?;
        Ok(manager)
    }

    fn reload(&self) -> Result<(), ManagerError> {
        for identifier in self.store.list_identifiers()? {
            match Controller::load(
                self.store.clone(),
                self.factory.clone(),
                &identifier,
                self.protocol_version,
                self.auto_reconnect_interval,
            ) {
                Ok(controller) => self.register(controller),
                Err(err) => {
                    tracing::warn!(identifier = %identifier, error = %err, "failed to reload persisted session, skipping");
                }
            }
        }
        Ok(())
    }

    /// Register a freshly created or reloaded controller, and start fanning
    /// its change notifications into the Manager-wide change-tracker index
    /// (spec §4.3 "a change tracker"; grounded in `oj-daemon`'s EventBus
    /// "every mutation is observable" idiom, simplified since there is no
    /// WAL here).
    fn register(&self, controller: Arc<Controller>) {
        let identifier = controller.record().identifier.clone();
        let mut changed = controller.subscribe();
        let change_index = self.change_index.clone();
        tokio::spawn(async move {
            while changed.changed().await.is_ok() {
                change_index.fetch_add(1, Ordering::Relaxed);
            }
        });
        self.controllers.write().insert(identifier, controller);
    }

    fn ensure_accepting_operations(&self) -> Result<(), ManagerError> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(ManagerError::ShutDown);
        }
        Ok(())
    }

    fn matched(&self, selection: &Selection) -> Vec<Arc<Controller>> {
        let controllers = self.controllers.read();
        match selection {
            Selection::All => controllers.values().cloned().collect(),
            Selection::Ids(ids) => ids.iter().filter_map(|id| controllers.get(id).cloned()).collect(),
            Selection::Labels(predicate) => controllers
                .values()
                .filter(|controller| relay_core::labels::matches(&controller.record().labels, predicate))
                .cloned()
                .collect(),
        }
    }

    /// Construct and persist a new session (spec §4.2 `Create`, dispatched
    /// by the Manager so its registry and change tracker stay in sync).
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        ctx: CancellationToken,
        source: String,
        destination: String,
        config: MergedConfig,
        config_source: MergedConfig,
        config_destination: MergedConfig,
        name: String,
        options: CoreOptions,
        prompter: &dyn Prompter,
    ) -> Result<Arc<Controller>, ManagerError> {
        self.ensure_accepting_operations()?;
        tracing::info!(%name, paused = options.paused, "manager: creating session");
        // The Manager's auto_reconnect_interval always wins over the caller's,
        // so every controller it owns reconnects on the same cadence.
        let options = CoreOptions { auto_reconnect_interval: self.auto_reconnect_interval, ..options };
        let controller = Controller::create(
            ctx,
            self.store.clone(),
            self.factory.clone(),
            self.clock.epoch_ms(),
            self.protocol_version,
            self.creating_version,
            source,
            destination,
            config,
            config_source,
            config_destination,
            name,
            options,
            prompter,
        )
        .await?;
        self.register(controller.clone());
        Ok(controller)
    }

    /// Snapshot every matched session, alongside the change-tracker index
    /// observed at the moment of the call (spec §4.3 `List`).
    pub fn list(&self, selection: &Selection) -> Result<ListResult, ManagerError> {
        self.ensure_accepting_operations()?;
        let sessions = self.matched(selection).iter().map(|controller| controller.snapshot()).collect();
        Ok(ListResult { change_index: self.change_index.load(Ordering::Relaxed), sessions })
    }

    /// Force every matched session's current record to disk (spec §4.3
    /// `Flush`).
    pub async fn flush(&self, selection: &Selection) -> Result<Vec<(SessionId, ManagerError)>, ManagerError> {
        self.ensure_accepting_operations()?;
        let mut errors = Vec::new();
        for controller in self.matched(selection) {
            if let Err(err) = controller.flush().await {
                errors.push((controller.record().identifier, err.into()));
            }
        }
        Ok(errors)
    }

    /// Pause every matched session (spec §4.3 `Pause`).
    pub async fn pause(&self, selection: &Selection) -> Result<Vec<(SessionId, ManagerError)>, ManagerError> {
        self.ensure_accepting_operations()?;
        self.halt_matched(selection, HaltMode::Pause).await
    }

    /// Resume every matched session, attempting source and destination
    /// connects and spawning a supervisor for each (spec §4.3 `Resume`).
    pub async fn resume(&self, selection: &Selection, prompter: &dyn Prompter) -> Result<Vec<(SessionId, ManagerError)>, ManagerError> {
        self.ensure_accepting_operations()?;
        let mut errors = Vec::new();
        for controller in self.matched(selection) {
            if let Err(err) = controller.resume(CancellationToken::new(), prompter).await {
                errors.push((controller.record().identifier, err.into()));
            }
        }
        Ok(errors)
    }

    /// Terminate every matched session: halt it and remove it, along with
    /// its persisted record, from the registry (spec §4.3 `Terminate`).
    pub async fn terminate(&self, selection: &Selection) -> Result<Vec<(SessionId, ManagerError)>, ManagerError> {
        self.ensure_accepting_operations()?;
        let mut errors = Vec::new();
        for controller in self.matched(selection) {
            let identifier = controller.record().identifier;
            match controller.halt(HaltMode::Terminate).await {
                Ok(()) => {
                    self.controllers.write().remove(&identifier);
                    tracing::info!(session_id = %identifier, "manager: session terminated");
                }
                Err(err) => errors.push((identifier, err.into())),
            }
        }
        Ok(errors)
    }

    /// Halt every session with `Shutdown` mode; after this call the Manager
    /// accepts no further operations (spec §4.3 "Shutdown is Manager-wide").
    pub async fn shutdown(&self) -> Vec<(SessionId, ManagerError)> {
        tracing::info!("manager: shutting down, no further operations will be accepted");
        self.shut_down.store(true, Ordering::SeqCst);
        let mut errors = Vec::new();
        let controllers: Vec<_> = self.controllers.read().values().cloned().collect();
        for controller in controllers {
            if let Err(err) = controller.halt(HaltMode::Shutdown).await {
                errors.push((controller.record().identifier, err.into()));
            }
        }
        errors
    }

    async fn halt_matched(&self, selection: &Selection, mode: HaltMode) -> Result<Vec<(SessionId, ManagerError)>, ManagerError> {
        let mut errors = Vec::new();
        for controller in self.matched(selection) {
            if let Err(err) = controller.halt(mode).await {
                errors.push((controller.record().identifier, err.into()));
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
