use async_trait::async_trait;
use helpdesk_core::{ExecutionContext, Stage, StageError, TicketContext};
use tracing::info;

/// Accepts the payload. Issues no calls; refuses contexts that have already
/// been through a run.
#[derive(Default)]
pub struct IntakeStage;

#[async_trait]
impl Stage for IntakeStage {
    fn name(&self) -> &'static str {
        "Intake"
    }

    async fn run(&self, ticket: &mut TicketContext, _ctx: &ExecutionContext) -> Result<(), StageError> {
        if !ticket.call_log().is_empty() || ticket.decision().is_some() {
            return Err(StageError::ValidationFailed(format!(
                "ticket {} already carries results from an earlier run",
                ticket.ticket_id()
            )));
        }
        info!(ticket_id = ticket.ticket_id(), priority = %ticket.priority(), "payload accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx, ticket};
    use helpdesk_core::CallOutcome;
    use helpdesk_mcp::ProviderRegistry;

    #[tokio::test]
    async fn test_fresh_ticket_passes_untouched() {
        let mut t = ticket();
        let before = t.fingerprint();
        IntakeStage.run(&mut t, &ctx(ProviderRegistry::reference())).await.unwrap();
        assert_eq!(before, t.fingerprint());
    }

    #[tokio::test]
    async fn test_reused_ticket_rejected() {
        let mut t = ticket();
        t.push_call("Understand", "COMMON", "parse_request_text", CallOutcome::Error { message: "x".into() }, 1, 0);
        let err = IntakeStage.run(&mut t, &ctx(ProviderRegistry::reference())).await.unwrap_err();
        assert!(matches!(err, StageError::ValidationFailed(_)));
    }
}
