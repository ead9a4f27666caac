//! Human clarification suspend point.
//!
//! The Ask stage hands its question to a [`ClarificationSource`] and awaits
//! the answer. The stage, not the source, bounds the wait with
//! `EngineConfig::clarification_timeout_ms`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::info;

/// Answer the reference flow assumes the customer gives.
pub const REFERENCE_ANSWER: &str = r#"{"order_number":"12345","purchase_date":"2024-01-15"}"#;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClarificationError {
    #[error("CLARIFY/ALREADY_PENDING: {0}")]
    AlreadyPending(String),

    #[error("CLARIFY/NO_PENDING: {0}")]
    NoPendingRequest(String),

    /// The responder went away without answering.
    #[error("CLARIFY/ABANDONED: {0}")]
    Abandoned(String),
}

#[async_trait]
pub trait ClarificationSource: Send + Sync {
    /// Suspend until a human answers `question` for `ticket_id`.
    async fn await_answer(&self, ticket_id: &str, question: &str)
        -> Result<String, ClarificationError>;
}

/// Answers every question with the same text, optionally after a delay.
#[derive(Debug, Clone)]
pub struct FixedAnswer {
    answer: String,
    delay: Duration,
}

impl FixedAnswer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn reference() -> Self {
        Self::new(REFERENCE_ANSWER)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ClarificationSource for FixedAnswer {
    async fn await_answer(&self, ticket_id: &str, _question: &str) -> Result<String, ClarificationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        info!(ticket_id, "clarification answered");
        Ok(self.answer.clone())
    }
}

struct Pending {
    token: u64,
    question: String,
    reply: oneshot::Sender<String>,
}

/// Parks runs until an external caller supplies the answer.
///
/// Each ticket can have at most one outstanding question. A run that times
/// out or is cancelled withdraws its question.
#[derive(Default)]
pub struct ClarificationInbox {
    pending: Mutex<HashMap<String, Pending>>,
    next_token: AtomicU64,
}

impl ClarificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Outstanding `(ticket_id, question)` pairs, sorted by ticket id.
    pub fn pending(&self) -> Vec<(String, String)> {
        let mut out: Vec<_> = self
            .lock()
            .iter()
            .map(|(id, p)| (id.clone(), p.question.clone()))
            .collect();
        out.sort();
        out
    }

    pub fn is_waiting(&self, ticket_id: &str) -> bool {
        self.lock().contains_key(ticket_id)
    }

    /// Resume the run waiting on `ticket_id`.
    pub fn answer(&self, ticket_id: &str, answer: impl Into<String>) -> Result<(), ClarificationError> {
        let pending = self
            .lock()
            .remove(ticket_id)
            .ok_or_else(|| ClarificationError::NoPendingRequest(ticket_id.to_string()))?;
        pending
            .reply
            .send(answer.into())
            .map_err(|_| ClarificationError::Abandoned(ticket_id.to_string()))
    }

    /// Drop the question for `ticket_id` unanswered. The waiting run fails
    /// with [`ClarificationError::Abandoned`].
    pub fn dismiss(&self, ticket_id: &str) -> Result<(), ClarificationError> {
        let removed = self.lock().remove(ticket_id);
        if removed.is_none() {
            return Err(ClarificationError::NoPendingRequest(ticket_id.to_string()));
        }
        info!(ticket_id, "clarification dismissed");
        Ok(())
    }
}

/// Withdraws the question when the waiting future is dropped. Only the
/// entry registered by the same call is removed; a later question for the
/// same ticket is left alone.
struct Withdraw<'a> {
    inbox: &'a ClarificationInbox,
    ticket_id: &'a str,
    token: u64,
}

impl Drop for Withdraw<'_> {
    fn drop(&mut self) {
        let mut pending = self.inbox.lock();
        if pending.get(self.ticket_id).is_some_and(|p| p.token == self.token) {
            pending.remove(self.ticket_id);
        }
    }
}

#[async_trait]
impl ClarificationSource for ClarificationInbox {
    async fn await_answer(&self, ticket_id: &str, question: &str) -> Result<String, ClarificationError> {
        let (tx, rx) = oneshot::channel();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut pending = self.lock();
            if pending.contains_key(ticket_id) {
                return Err(ClarificationError::AlreadyPending(ticket_id.to_string()));
            }
            pending.insert(
                ticket_id.to_string(),
                Pending {
                    token,
                    question: question.to_string(),
                    reply: tx,
                },
            );
        }
        let _withdraw = Withdraw {
            inbox: self,
            ticket_id,
            token,
        };
        info!(ticket_id, question, "awaiting clarification");
        rx.await
            .map_err(|_| ClarificationError::Abandoned(ticket_id.to_string()))
    }
}
