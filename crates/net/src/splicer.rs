// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream splicer: bidirectional byte copy between two open streams until
//! either closes (spec §4.2 "Splicer").
//!
//! Grounded on the standard `tokio::io::copy_bidirectional` shape, but
//! implemented as two independent pump loops rather than one fused future
//! so that each direction can report bytes as they accrue (scenario §8.4
//! requires `bytesOutbound` to be observable *while* a stream is still
//! open, not only once it closes).

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::endpoint::DuplexStream;

const BUF_SIZE: usize = 16 * 1024;

/// Direction a pump loop copies in, named after the counters in spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Source → destination.
    Outbound,
    /// Destination → source.
    Inbound,
}

/// Receives byte counts as a splice progresses.
///
/// Implemented by the controller crate to forward into the state-locked
/// `StateSnapshot` counters; kept as a trait here so `relay-net` does not
/// need to depend on `relay-controller`.
pub trait SpliceObserver: Send + Sync {
    fn on_outbound_bytes(&self, n: u64);
    fn on_inbound_bytes(&self, n: u64);
}

/// Why a splice ended.
#[derive(Debug)]
pub enum SpliceOutcome {
    /// One side closed (EOF) or errored; carries the direction's error if any.
    Closed { outbound_error: Option<std::io::Error>, inbound_error: Option<std::io::Error> },
    /// `ctx` was cancelled before either side closed.
    Cancelled,
}

async fn pump(
    mut reader: impl tokio::io::AsyncRead + Unpin,
    mut writer: impl tokio::io::AsyncWrite + Unpin,
    direction: Direction,
    observer: &dyn SpliceObserver,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            let _ = writer.shutdown().await;
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
        match direction {
            Direction::Outbound => observer.on_outbound_bytes(n as u64),
            Direction::Inbound => observer.on_inbound_bytes(n as u64),
        }
    }
}

/// Splice `inbound` (the stream accepted from the source) and `outbound`
/// (the stream dialed to the destination) until either direction closes or
/// `ctx` is cancelled. Both streams are shut down on every exit path.
pub async fn splice(
    ctx: CancellationToken,
    inbound: DuplexStream,
    outbound: DuplexStream,
    observer: Arc<dyn SpliceObserver>,
) -> SpliceOutcome {
    let (inbound_rd, inbound_wr) = tokio::io::split(inbound);
    let (outbound_rd, outbound_wr) = tokio::io::split(outbound);

    let obs_a = observer.clone();
    let to_destination =
        tokio::spawn(async move { pump(inbound_rd, outbound_wr, Direction::Outbound, obs_a.as_ref()).await });
    let obs_b = observer.clone();
    let to_source =
        tokio::spawn(async move { pump(outbound_rd, inbound_wr, Direction::Inbound, obs_b.as_ref()).await });

    let outcome = tokio::select! {
        _ = ctx.cancelled() => SpliceOutcome::Cancelled,
        r = to_destination => SpliceOutcome::Closed {
            outbound_error: r.ok().and_then(|r| r.err()),
            inbound_error: None,
        },
        r = to_source => SpliceOutcome::Closed {
            outbound_error: None,
            inbound_error: r.ok().and_then(|r| r.err()),
        },
    };

    // Whichever pump "won" the select above has already shut its writer
    // down on a clean read-EOF, but the loser and the cancellation path
    // have not — aborting both unconditionally is harmless and guarantees
    // both streams are released on every exit path (spec §4.2 Splicer:
    // "MUST, on any exit path ... close both streams").
    to_destination.abort();
    to_source.abort();

    outcome
}

#[cfg(test)]
#[path = "splicer_tests.rs"]
mod tests;
