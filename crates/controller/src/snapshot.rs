// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Published controller state (spec §3 "StateSnapshot") behind the state
//! lock (spec §5): "the only lock splicers take", supports
//! `UnlockWithoutNotify` for `Snapshot()`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use relay_core::SessionId;
use relay_storage::SessionRecord;
use tokio::sync::watch;

use crate::status::Status;

/// Monotonic counters for one forward-phase "generation".
///
/// Splicers hold a clone of the `Arc` captured when their forward phase
/// began and mutate it lock-free; when the phase unwinds, `StateCell`
/// swaps in a fresh `Arc` for the next phase (spec §4.2 "the old
/// `liveSnapshot` may still be mutated by in-flight splicers ... the
/// counters on the old snapshot are simply not observed").
#[derive(Default)]
pub struct SnapshotCounters {
    pub open_streams: AtomicU64,
    pub total_streams: AtomicU64,
    pub bytes_outbound: AtomicU64,
    pub bytes_inbound: AtomicU64,
}

/// A shallow, publishable copy of a Controller's current condition.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub identifier: SessionId,
    pub status: Status,
    pub source_connected: bool,
    pub destination_connected: bool,
    pub open_streams: u64,
    pub total_streams: u64,
    pub bytes_outbound: u64,
    pub bytes_inbound: u64,
    pub last_error: String,
}

struct StateInner {
    status: Status,
    source_connected: bool,
    destination_connected: bool,
    last_error: String,
    counters: Arc<SnapshotCounters>,
    record: SessionRecord,
}

/// The state lock: guards the published status fields, the active
/// counters generation, and `SessionRecord::paused`.
pub struct StateCell {
    inner: Mutex<StateInner>,
    changed: watch::Sender<()>,
}

impl StateCell {
    pub fn new(record: SessionRecord) -> (Self, watch::Receiver<()>) {
        let (tx, rx) = watch::channel(());
        let cell = Self {
            inner: Mutex::new(StateInner {
                status: Status::Disconnected,
                source_connected: false,
                destination_connected: false,
                last_error: String::new(),
                counters: Arc::new(SnapshotCounters::default()),
                record,
            }),
            changed: tx,
        };
        (cell, rx)
    }

    /// Subscribe to change notifications. Every release path except
    /// `snapshot()` fires this.
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.changed.subscribe()
    }

    /// Shallow-copy the current snapshot without firing the change
    /// notification (spec §4.2 `Snapshot`).
    pub fn snapshot(&self) -> StateSnapshot {
        let guard = self.inner.lock();
        let snapshot = StateSnapshot {
            identifier: guard.record.identifier.clone(),
            status: guard.status,
            source_connected: guard.source_connected,
            destination_connected: guard.destination_connected,
            open_streams: guard.counters.open_streams.load(Ordering::Relaxed),
            total_streams: guard.counters.total_streams.load(Ordering::Relaxed),
            bytes_outbound: guard.counters.bytes_outbound.load(Ordering::Relaxed),
            bytes_inbound: guard.counters.bytes_inbound.load(Ordering::Relaxed),
            last_error: guard.last_error.clone(),
        };
        drop(guard);
        snapshot
    }

    /// Read-only copy of the persisted record. Does not notify.
    pub fn record(&self) -> SessionRecord {
        self.inner.lock().record.clone()
    }

    /// Set `paused` on the in-memory record and return the updated record
    /// for the caller to persist outside the lock.
    pub fn set_paused(&self, paused: bool) -> SessionRecord {
        let mut guard = self.inner.lock();
        guard.record.paused = paused;
        let record = guard.record.clone();
        drop(guard);
        let _ = self.changed.send(());
        record
    }

    pub fn set_connecting(&self, status: Status) {
        let mut guard = self.inner.lock();
        guard.status = status;
        drop(guard);
        let _ = self.changed.send(());
    }

    pub fn set_source_connected(&self, connected: bool) {
        let mut guard = self.inner.lock();
        guard.source_connected = connected;
        drop(guard);
        let _ = self.changed.send(());
    }

    pub fn set_destination_connected(&self, connected: bool) {
        let mut guard = self.inner.lock();
        guard.destination_connected = connected;
        drop(guard);
        let _ = self.changed.send(());
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let mut guard = self.inner.lock();
        guard.last_error = message.into();
        drop(guard);
        let _ = self.changed.send(());
    }

    /// Enter a new forward phase: clear `lastError`, publish
    /// `ForwardingStreams`, and install a fresh counters generation,
    /// returning the `Arc` the supervisor hands to its splicers.
    pub fn enter_forward_phase(&self) -> Arc<SnapshotCounters> {
        let mut guard = self.inner.lock();
        guard.last_error.clear();
        guard.status = Status::ForwardingStreams;
        let counters = Arc::new(SnapshotCounters::default());
        guard.counters = counters.clone();
        drop(guard);
        let _ = self.changed.send(());
        counters
    }

    /// Replace the published snapshot with a fresh one carrying only
    /// identity and `lastError` (spec §4.2: "the snapshot is *replaced*
    /// with a fresh value"). In-flight splicers retain their own `Arc`
    /// clone of the old counters and keep mutating it harmlessly.
    pub fn reset_to_fresh(&self, last_error: impl Into<String>) {
        let mut guard = self.inner.lock();
        guard.status = Status::Disconnected;
        guard.source_connected = false;
        guard.destination_connected = false;
        guard.last_error = last_error.into();
        guard.counters = Arc::new(SnapshotCounters::default());
        drop(guard);
        let _ = self.changed.send(());
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
