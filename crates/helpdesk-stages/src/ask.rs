use async_trait::async_trait;
use helpdesk_core::capability::invoke_logged;
use helpdesk_core::providers::ATLAS;
use helpdesk_core::{CapabilityCall, ExecutionContext, Stage, StageError, TicketContext};
use tracing::info;

/// Asks the provider for a clarification question, then suspends until a
/// human answers it or the clarification timeout expires.
#[derive(Default)]
pub struct AskStage;

#[async_trait]
impl Stage for AskStage {
    fn name(&self) -> &'static str {
        "Ask"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let call = CapabilityCall::new(ATLAS, "clarify_question", ticket.query());
        let result = invoke_logged(ticket, ctx, self.name(), call).await?;
        let question = result
            .get("question")
            .and_then(|q| q.as_str())
            .ok_or(StageError::MalformedResult {
                ability: "clarify_question",
                field: "question",
            })?
            .to_string();
        ticket.set_clarification_question(question.clone())?;

        info!(ticket_id = ticket.ticket_id(), %question, "waiting for human response");
        let timeout = ctx.config.clarification_timeout();
        let answer = tokio::time::timeout(
            timeout,
            ctx.clarifier.await_answer(ticket.ticket_id(), &question),
        )
        .await
        .map_err(|_| StageError::ClarificationTimeout {
            waited_ms: timeout.as_millis() as u64,
        })??;

        ticket.set_clarification_answer(answer)?;
        Ok(())
    }
}
