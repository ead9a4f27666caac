use async_trait::async_trait;
use helpdesk_core::capability::invoke_logged;
use helpdesk_core::providers::ATLAS;
use helpdesk_core::{CapabilityCall, ExecutionContext, Stage, StageError, TicketContext};

#[derive(Default)]
pub struct RetrieveStage;

#[async_trait]
impl Stage for RetrieveStage {
    fn name(&self) -> &'static str {
        "Retrieve"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let answer = ticket
            .clarification_answer()
            .ok_or(StageError::MissingField("clarification_answer"))?;
        let search = format!("{} {}", ticket.query(), answer);
        let call = CapabilityCall::new(ATLAS, "knowledge_base_search", search);
        let kb = invoke_logged(ticket, ctx, self.name(), call).await?;
        ticket.set_kb_data(kb)?;
        Ok(())
    }
}
