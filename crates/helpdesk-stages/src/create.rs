use async_trait::async_trait;
use helpdesk_core::capability::invoke_logged;
use helpdesk_core::providers::COMMON;
use helpdesk_core::{CapabilityCall, ExecutionContext, Stage, StageError, TicketContext};

/// Generates the customer-facing response.
#[derive(Default)]
pub struct CreateStage;

#[async_trait]
impl Stage for CreateStage {
    fn name(&self) -> &'static str {
        "Create"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let decision = ticket.decision().ok_or(StageError::MissingField("decision"))?;
        let prompt = format!("{} Decision: {}", ticket.query(), decision);
        let call = CapabilityCall::new(COMMON, "response_generation", prompt);
        let response = invoke_logged(ticket, ctx, self.name(), call).await?;
        ticket.set_generated_response(response)?;
        Ok(())
    }
}
