//! Ticket Desk: the `submit_ticket` entry point
use helpdesk_core::{
    CapabilityClient, ClarificationSource, EngineConfig, ExecutionContext, HelpdeskError,
    StageError, StageTrace, Summary, TicketContext, TicketFields, WorkflowEngine,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct TicketRun {
    pub summary: Summary,
    pub ticket: TicketContext,
    pub traces: Vec<StageTrace>,
}

/// Validates submissions and drives them through the standard pipeline.
///
/// Holds no per-ticket state: concurrent submissions each get their own
/// context and share only the client, the clarification source and config.
pub struct TicketDesk {
    engine: WorkflowEngine,
    client: Arc<dyn CapabilityClient>,
    clarifier: Arc<dyn ClarificationSource>,
    config: Arc<EngineConfig>,
}

impl TicketDesk {
    pub fn new(
        client: Arc<dyn CapabilityClient>,
        clarifier: Arc<dyn ClarificationSource>,
        config: EngineConfig,
    ) -> Self {
        Self::with_engine(crate::standard_pipeline(), client, clarifier, config)
    }

    pub fn with_engine(
        engine: WorkflowEngine,
        client: Arc<dyn CapabilityClient>,
        clarifier: Arc<dyn ClarificationSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            engine,
            client,
            clarifier,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub async fn submit_ticket(&self, fields: TicketFields) -> Result<Summary, HelpdeskError> {
        self.submit_with_cancel(fields, CancellationToken::new()).await
    }

    /// Like [`submit_ticket`](Self::submit_ticket), but abortable through `cancel`.
    pub async fn submit_with_cancel(
        &self,
        fields: TicketFields,
        cancel: CancellationToken,
    ) -> Result<Summary, HelpdeskError> {
        Ok(self.run_ticket(fields, cancel).await?.summary)
    }

    /// Run a ticket and keep the final context and stage traces.
    pub async fn run_ticket(
        &self,
        fields: TicketFields,
        cancel: CancellationToken,
    ) -> Result<TicketRun, HelpdeskError> {
        let ticket = TicketContext::from_fields(fields)?;
        let ctx = ExecutionContext::with_shared_config(
            self.client.clone(),
            self.clarifier.clone(),
            self.config.clone(),
        )
        .with_cancel(cancel);

        let (ticket, traces) = self.engine.run(ticket, &ctx).await?;
        let summary = Summary::project(&ticket).map_err(|e| HelpdeskError::StageFailure {
            stage: "Complete".to_string(),
            cause: StageError::Context(e),
        })?;
        info!(
            run_id = %ctx.run_id,
            ticket_id = %summary.ticket_id,
            decision = %summary.decision,
            "ticket resolved"
        );

        Ok(TicketRun {
            summary,
            ticket,
            traces,
        })
    }
}
