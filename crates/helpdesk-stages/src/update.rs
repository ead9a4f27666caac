use async_trait::async_trait;
use helpdesk_core::capability::invoke_logged;
use helpdesk_core::providers::ATLAS;
use helpdesk_core::{CapabilityCall, Decision, ExecutionContext, Stage, StageError, TicketContext};

/// Escalated tickets stay open with an updated status; auto-resolved ones
/// are closed. Exactly one call either way.
#[derive(Default)]
pub struct UpdateStage;

#[async_trait]
impl Stage for UpdateStage {
    fn name(&self) -> &'static str {
        "Update"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let ability = match ticket.decision() {
            Some(Decision::Escalated) => "update_ticket",
            Some(Decision::AutoResolve) => "close_ticket",
            None => return Err(StageError::MissingField("decision")),
        };
        let call = CapabilityCall::new(ATLAS, ability, ticket.ticket_id());
        invoke_logged(ticket, ctx, self.name(), call).await?;
        Ok(())
    }
}
