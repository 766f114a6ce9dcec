// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint construction (spec §4.1, §6) and the prompting capability
//! threaded through it (spec §6, §9).

use async_trait::async_trait;
use relay_core::{MergedConfig, ProtocolGeneration, SessionId};
use tokio_util::sync::CancellationToken;

use crate::endpoint::{Endpoint, Orientation};
use crate::error::EndpointError;

/// A capability for surfacing messages and collecting user input during
/// endpoint construction (spec §6: "the service wraps the stream in a
/// Prompter capability").
///
/// Lifecycle methods pass a real prompter; the supervisor always passes
/// [`NullPrompter`] on its own retries (spec §9: "the supervisor runs
/// without one and must never trigger a prompt").
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Surface an informational message; never blocks.
    fn message(&self, text: &str);

    /// Ask a question and wait for the answer.
    async fn prompt(&self, text: &str) -> String;
}

/// A prompter that never prompts: messages are dropped (beyond a trace
/// event), and a `prompt` call indicates a construction path incorrectly
/// attempted interactive input from a background retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPrompter;

#[async_trait]
impl Prompter for NullPrompter {
    fn message(&self, text: &str) {
        tracing::debug!(message = text, "endpoint message dropped by null prompter");
    }

    async fn prompt(&self, text: &str) -> String {
        tracing::warn!(prompt = text, "unexpected prompt from a non-interactive retry");
        String::new()
    }
}

/// Constructs [`Endpoint`]s. Out of scope per spec §1 — URL resolution,
/// transport dialing, authentication, and prompting live entirely on the
/// implementation side; the core only calls through this trait.
#[async_trait]
pub trait EndpointFactory: Send + Sync {
    /// Construct a new endpoint.
    ///
    /// Potentially slow and cancellable via `ctx`; the prompter must not be
    /// retained beyond this call returning (spec §4.1, §9).
    #[allow(clippy::too_many_arguments)]
    async fn connect(
        &self,
        ctx: CancellationToken,
        url: &str,
        prompter: &dyn Prompter,
        session_id: &SessionId,
        version: ProtocolGeneration,
        config: MergedConfig,
        orientation: Orientation,
    ) -> Result<Box<dyn Endpoint>, EndpointError>;
}
