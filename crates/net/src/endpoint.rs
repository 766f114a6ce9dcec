// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint: one side of a forwarding session (spec §4.1).
//!
//! The core never distinguishes a source from a destination beyond the
//! [`Orientation`] tag recorded at construction (spec §9 "the accept/dial
//! asymmetry"); everything else about `Open`/`Shutdown` semantics is the
//! same trait either way.

use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

use crate::error::EndpointError;

/// Which side of the session an endpoint represents.
///
/// Purely a tag: the core treats `Open()` identically regardless of
/// orientation (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Source,
    Destination,
}

relay_core::simple_display! {
    Orientation {
        Source => "source",
        Destination => "destination",
    }
}

/// A full-duplex byte stream, opaque beyond `AsyncRead`/`AsyncWrite`.
pub type DuplexStream = Pin<Box<dyn AsyncReadWrite>>;

/// Marker trait bundling the two halves of a full-duplex stream into one
/// trait object.
pub trait AsyncReadWrite: AsyncRead + AsyncWrite + Send {}
impl<T: AsyncRead + AsyncWrite + Send + ?Sized> AsyncReadWrite for T {}

/// A transport-level fault reported asynchronously by an endpoint's
/// underlying connection (keepalive failure, peer vanish, TLS fault).
#[derive(Debug, Clone)]
pub struct TransportFault(pub String);

impl std::fmt::Display for TransportFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One side of a forwarding session (spec §4.1).
///
/// Endpoints are produced by an out-of-scope [`crate::factory::EndpointFactory`]
/// and owned exclusively by whichever task currently holds them (spec §3
/// "Endpoint handle").
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Accept the next inbound stream (source) or dial a new outbound
    /// stream (destination). May block; must unblock with an error when
    /// [`Endpoint::shutdown`] is called concurrently.
    async fn open(&self) -> Result<DuplexStream, EndpointError>;

    /// A one-shot channel that yields exactly one error if the endpoint's
    /// underlying transport dies asynchronously. The core subscribes at
    /// most once per endpoint instantiation (spec §4.1).
    fn transport_errors(&self) -> oneshot::Receiver<TransportFault>;

    /// Idempotent, synchronous shutdown. Must unblock any concurrent
    /// `open()` call with an error.
    fn shutdown(&self);

    /// The orientation this endpoint was constructed with.
    fn orientation(&self) -> Orientation;
}
