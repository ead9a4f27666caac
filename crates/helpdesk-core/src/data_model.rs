//! Data Model: ticket input, call records, stage traces and the summary projection
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ContextError, HelpdeskError};
use crate::ticket::TicketContext;

/// Structured mapping returned by capability providers.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Status stamped on every summary produced by the Complete stage.
pub const STATUS_COMPLETE: &str = "processing_complete";

/// Raw ticket submission. Every field is required; missing keys deserialize
/// as empty strings so validation can name the offending field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketFields {
    pub customer_name: String,
    pub email: String,
    pub query: String,
    pub priority: String,
    pub ticket_id: String,
}

impl TicketFields {
    /// Check required fields and parse the priority.
    pub fn validate(&self) -> Result<Priority, HelpdeskError> {
        let required = [
            ("ticket_id", &self.ticket_id),
            ("customer_name", &self.customer_name),
            ("email", &self.email),
            ("query", &self.query),
            ("priority", &self.priority),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(HelpdeskError::InvalidTicket {
                    field,
                    reason: "required field is missing or blank".to_string(),
                });
            }
        }

        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {}
            _ => {
                return Err(HelpdeskError::InvalidTicket {
                    field: "email",
                    reason: format!("'{}' is not an email address", self.email),
                })
            }
        }

        self.priority.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(HelpdeskError::InvalidTicket {
                field: "priority",
                reason: format!("'{}' is not one of low, medium, high", other),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the decision gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    AutoResolve,
    Escalated,
}

impl Decision {
    /// Scores strictly below the threshold escalate.
    pub fn from_score(score: u8, threshold: u8) -> Self {
        if score < threshold {
            Self::Escalated
        } else {
            Self::AutoResolve
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoResolve => "auto_resolve",
            Self::Escalated => "escalated",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the call log: a single logical capability invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// Position in the call log (0-based)
    pub seq: usize,
    /// Stage that issued the call
    pub stage: String,
    pub provider: String,
    pub ability: String,
    pub outcome: CallOutcome,
    /// Attempts made, retries included
    pub attempts: u32,
    pub latency_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CallRecord {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, CallOutcome::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Ok { result: Payload },
    Error { message: String },
}

/// Per-stage execution record collected by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTrace {
    pub stage: String,
    /// Fingerprint of the ticket context before the stage ran
    pub in_hash: String,
    /// Fingerprint of the ticket context after the stage ran
    pub out_hash: String,
    /// Call log entries appended by this stage
    pub calls: usize,
    pub deterministic: bool,
    pub latency_ms: u64,
}

/// Read-only projection of a completed ticket run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub ticket_id: String,
    pub customer: String,
    pub priority: Priority,
    pub decision: Decision,
    pub solution_score: u8,
    pub response: Payload,
    pub mcp_calls_made: usize,
    pub status: String,
}

impl Summary {
    /// Project a completed context. Fails if the gate or the Create stage
    /// never ran.
    pub fn project(ticket: &TicketContext) -> Result<Self, ContextError> {
        let (solution_score, decision) = ticket
            .solution_score()
            .zip(ticket.decision())
            .ok_or(ContextError::Missing("decision"))?;
        let response = ticket
            .generated_response()
            .cloned()
            .ok_or(ContextError::Missing("generated_response"))?;

        Ok(Self {
            ticket_id: ticket.ticket_id().to_string(),
            customer: ticket.customer_name().to_string(),
            priority: ticket.priority(),
            decision,
            solution_score,
            response,
            mcp_calls_made: ticket.call_log().len(),
            status: STATUS_COMPLETE.to_string(),
        })
    }
}
