//! Stage Trait: the single contract every workflow stage implements
use async_trait::async_trait;
use thiserror::Error;

use crate::capability::CapabilityError;
use crate::clarification::ClarificationError;
use crate::context::ExecutionContext;
use crate::error::ContextError;
use crate::ticket::TicketContext;

/// One ordered unit of work over the ticket context.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name as reported in failures and traces (ex: "Understand")
    fn name(&self) -> &'static str;

    /// False when the stage's outcome depends on a non-deterministic oracle
    fn deterministic(&self) -> bool {
        true
    }

    /// Run the stage, mutating `ticket` in place. Mutations made before an
    /// error are not rolled back.
    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError>;
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Clarification(#[from] ClarificationError),

    #[error("CLARIFY/TIMEOUT: no answer after {waited_ms}ms")]
    ClarificationTimeout { waited_ms: u64 },

    /// A field an earlier stage should have set is absent.
    #[error("STAGE/MISSING: {0}")]
    MissingField(&'static str),

    #[error("STAGE/SCORE: {0}")]
    InvalidScore(String),

    /// A provider answered without a field the stage depends on.
    #[error("STAGE/RESULT: {ability} returned no '{field}'")]
    MalformedResult {
        ability: &'static str,
        field: &'static str,
    },

    #[error("PARSE/VALIDATION: {0}")]
    ValidationFailed(String),
}
