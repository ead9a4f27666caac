use async_trait::async_trait;
use helpdesk_core::{ExecutionContext, Stage, StageError, Summary, TicketContext};
use tracing::info;

/// Pure read: checks the run can be summarized and emits the summary.
#[derive(Default)]
pub struct CompleteStage;

#[async_trait]
impl Stage for CompleteStage {
    fn name(&self) -> &'static str {
        "Complete"
    }

    async fn run(&self, ticket: &mut TicketContext, _ctx: &ExecutionContext) -> Result<(), StageError> {
        let summary = Summary::project(ticket)?;
        info!(
            ticket_id = %summary.ticket_id,
            decision = %summary.decision,
            solution_score = summary.solution_score,
            mcp_calls_made = summary.mcp_calls_made,
            "processing complete"
        );
        Ok(())
    }
}
