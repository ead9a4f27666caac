use async_trait::async_trait;
use helpdesk_core::capability::invoke_all;
use helpdesk_core::providers::ATLAS;
use helpdesk_core::{CapabilityCall, ExecutionContext, Stage, StageError, TicketContext};

/// The "Do" stage: pushes the outcome to downstream systems and notifies
/// the customer.
#[derive(Default)]
pub struct DoStage;

#[async_trait]
impl Stage for DoStage {
    fn name(&self) -> &'static str {
        "Do"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let calls = vec![
            CapabilityCall::new(ATLAS, "execute_api_calls", ticket.ticket_id()),
            CapabilityCall::new(ATLAS, "trigger_notifications", ticket.email()),
        ];
        invoke_all(ticket, ctx, self.name(), calls).await?;
        Ok(())
    }
}
