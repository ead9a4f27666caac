use async_trait::async_trait;
use helpdesk_core::capability::invoke_logged;
use helpdesk_core::providers::ATLAS;
use helpdesk_core::{CapabilityCall, ExecutionContext, Stage, StageError, TicketContext};

/// Turns the human's free-form answer into structured data.
#[derive(Default)]
pub struct WaitStage;

#[async_trait]
impl Stage for WaitStage {
    fn name(&self) -> &'static str {
        "Wait"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let answer = ticket
            .clarification_answer()
            .ok_or(StageError::MissingField("clarification_answer"))?;
        let call = CapabilityCall::new(ATLAS, "extract_answer", answer);
        invoke_logged(ticket, ctx, self.name(), call).await?;
        Ok(())
    }
}
