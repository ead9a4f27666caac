//! Capability Client contract and the invocation policy stages go through.
//!
//! Stages never talk to a client directly. `invoke_logged` and `invoke_all`
//! apply the per-attempt timeout and retry policy from [`EngineConfig`] and
//! append exactly one [`CallRecord`](crate::CallRecord) per logical call.
//!
//! [`EngineConfig`]: crate::EngineConfig

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::ExecutionContext;
use crate::data_model::{CallOutcome, Payload};
use crate::ticket::TicketContext;

/// Provider names used by the standard pipeline.
pub mod providers {
    /// General-purpose provider
    pub const COMMON: &str = "COMMON";
    /// Domain-specialized provider
    pub const ATLAS: &str = "ATLAS";
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// Unknown provider or ability. Never retried.
    #[error("CAPABILITY/NOT_FOUND: {provider}.{ability}")]
    NotFound { provider: String, ability: String },

    #[error("CAPABILITY/TIMEOUT: {provider}.{ability} after {after_ms}ms")]
    Timeout {
        provider: String,
        ability: String,
        after_ms: u64,
    },

    #[error("CAPABILITY/UNAVAILABLE: {provider}: {reason}")]
    Unavailable { provider: String, reason: String },
}

impl CapabilityError {
    pub fn not_found(provider: &str, ability: &str) -> Self {
        Self::NotFound {
            provider: provider.to_string(),
            ability: ability.to_string(),
        }
    }

    /// Timeouts and unavailability may clear up on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable { .. })
    }
}

/// A remote capability provider group. Implementations must be stateless
/// with respect to ticket runs so one client can serve concurrent runs.
#[async_trait]
pub trait CapabilityClient: Send + Sync {
    async fn invoke(
        &self,
        provider: &str,
        ability: &str,
        input: &Value,
    ) -> Result<Payload, CapabilityError>;
}

/// A single capability request issued by a stage.
#[derive(Debug, Clone)]
pub struct CapabilityCall {
    pub provider: &'static str,
    pub ability: &'static str,
    pub input: Value,
}

impl CapabilityCall {
    pub fn new(provider: &'static str, ability: &'static str, input: impl Into<Value>) -> Self {
        Self {
            provider,
            ability,
            input: input.into(),
        }
    }
}

struct Attempted {
    result: Result<Payload, CapabilityError>,
    attempts: u32,
    latency_ms: u64,
}

async fn execute(ctx: &ExecutionContext, call: &CapabilityCall) -> Attempted {
    let started = Instant::now();
    let timeout = ctx.config.call_timeout();
    let policy = &ctx.config.retry;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let result = match tokio::time::timeout(
            timeout,
            ctx.client.invoke(call.provider, call.ability, &call.input),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout {
                provider: call.provider.to_string(),
                ability: call.ability.to_string(),
                after_ms: timeout.as_millis() as u64,
            }),
        };

        match result {
            Err(e) if e.is_transient() && attempts <= policy.max_retries => {
                let delay = policy.backoff(attempts);
                warn!(
                    provider = call.provider,
                    ability = call.ability,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient capability failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            result => {
                return Attempted {
                    result,
                    attempts,
                    latency_ms: started.elapsed().as_millis() as u64,
                }
            }
        }
    }
}

fn record(
    ticket: &mut TicketContext,
    stage: &str,
    call: &CapabilityCall,
    attempted: Attempted,
) -> Result<Payload, CapabilityError> {
    let outcome = match &attempted.result {
        Ok(result) => CallOutcome::Ok {
            result: result.clone(),
        },
        Err(e) => CallOutcome::Error {
            message: e.to_string(),
        },
    };
    let seq = ticket.push_call(
        stage,
        call.provider,
        call.ability,
        outcome,
        attempted.attempts,
        attempted.latency_ms,
    );
    debug!(
        seq,
        stage,
        provider = call.provider,
        ability = call.ability,
        attempts = attempted.attempts,
        latency_ms = attempted.latency_ms,
        ok = attempted.result.is_ok(),
        "capability call"
    );
    attempted.result
}

/// Issue one call and log it against `stage`.
pub async fn invoke_logged(
    ticket: &mut TicketContext,
    ctx: &ExecutionContext,
    stage: &str,
    call: CapabilityCall,
) -> Result<Payload, CapabilityError> {
    let attempted = execute(ctx, &call).await;
    record(ticket, stage, &call, attempted)
}

/// Issue data-independent calls concurrently.
///
/// Log entries are appended in completion order. Every call is driven to
/// completion before the first error (in completion order) is returned.
/// Successful results come back in the order the calls were given.
pub async fn invoke_all(
    ticket: &mut TicketContext,
    ctx: &ExecutionContext,
    stage: &str,
    calls: Vec<CapabilityCall>,
) -> Result<Vec<Payload>, CapabilityError> {
    let mut results: Vec<Option<Payload>> = vec![None; calls.len()];
    let mut pending: FuturesUnordered<_> = calls
        .into_iter()
        .enumerate()
        .map(|(idx, call)| async move {
            let attempted = execute(ctx, &call).await;
            (idx, call, attempted)
        })
        .collect();

    let mut first_error = None;
    while let Some((idx, call, attempted)) = pending.next().await {
        match record(ticket, stage, &call, attempted) {
            Ok(result) => results[idx] = Some(result),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results.into_iter().flatten().collect()),
    }
}
