//! Unified Error Model
use thiserror::Error;

use crate::stage::StageError;

/// Errors surfaced to callers of a ticket run.
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// Rejected at submission; the engine never started.
    #[error("TICKET/INVALID: {field}: {reason}")]
    InvalidTicket { field: &'static str, reason: String },

    #[error("STAGE/{stage}: {cause}")]
    StageFailure {
        stage: String,
        #[source]
        cause: StageError,
    },

    #[error("RUN/CANCELLED: cancelled during {stage}")]
    Cancelled { stage: String },
}

impl HelpdeskError {
    /// Name of the stage the run stopped in, if it got that far.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::InvalidTicket { .. } => None,
            Self::StageFailure { stage, .. } | Self::Cancelled { stage } => Some(stage),
        }
    }
}

/// Violations of the ticket context's write-once rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("CONTEXT/ALREADY_SET: {0}")]
    AlreadySet(&'static str),

    #[error("CONTEXT/MISSING: {0}")]
    Missing(&'static str),

    #[error("CONTEXT/SCORE_RANGE: {0} is outside 0..=100")]
    ScoreOutOfRange(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CONFIG/PARSE: {0}")]
    Parse(String),

    #[error("CONFIG/INVALID: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
