//! Helpdesk Core: ticket context, stage contract and workflow engine
//!
//! A ticket run threads one [`TicketContext`] through an ordered list of
//! [`Stage`]s. Stages reach external capability providers only through
//! [`capability::invoke_logged`] / [`capability::invoke_all`], which apply
//! the configured timeout and retry policy and keep the call log.

pub mod capability;
pub mod clarification;
pub mod config;
pub mod context;
pub mod data_model;
pub mod error;
pub mod runner;
pub mod stage;
pub mod ticket;

pub use capability::{providers, CapabilityCall, CapabilityClient, CapabilityError};
pub use clarification::{ClarificationError, ClarificationInbox, ClarificationSource, FixedAnswer};
pub use config::{EngineConfig, RetryPolicy};
pub use context::ExecutionContext;
pub use data_model::{
    CallOutcome, CallRecord, Decision, Payload, Priority, StageTrace, Summary, TicketFields,
};
pub use error::{ConfigError, ContextError, HelpdeskError};
pub use runner::WorkflowEngine;
pub use stage::{Stage, StageError};
pub use ticket::TicketContext;

/// Engine version reported by the health endpoint
pub const HELPDESK_VERSION: &str = env!("CARGO_PKG_VERSION");
