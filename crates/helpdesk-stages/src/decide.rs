//! Decision gate: the only stage whose output changes downstream behaviour.
//!
//! The score comes from an external oracle and may differ between runs. The
//! branch taken for a given score does not: below
//! `EngineConfig::escalation_threshold` the ticket escalates and one extra
//! `escalation_decision` call is issued; at or above it the ticket is
//! auto-resolved with no further call.
use async_trait::async_trait;
use helpdesk_core::capability::invoke_logged;
use helpdesk_core::providers::{ATLAS, COMMON};
use helpdesk_core::{
    CapabilityCall, Decision, ExecutionContext, Payload, Stage, StageError, TicketContext,
};
use serde_json::Value;
use tracing::info;

#[derive(Default)]
pub struct DecideStage;

/// Read the integer `score` field of a scoring result.
pub fn read_score(result: &Payload) -> Result<u8, StageError> {
    let raw = result.get("score").ok_or(StageError::MalformedResult {
        ability: "solution_evaluation",
        field: "score",
    })?;
    raw.as_u64()
        .filter(|score| *score <= 100)
        .map(|score| score as u8)
        .ok_or_else(|| StageError::InvalidScore(format!("{} is not an integer in 0..=100", raw)))
}

#[async_trait]
impl Stage for DecideStage {
    fn name(&self) -> &'static str {
        "Decide"
    }

    fn deterministic(&self) -> bool {
        false
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let kb = ticket
            .kb_data()
            .cloned()
            .ok_or(StageError::MissingField("kb_data"))?;
        let eval = format!("{} {}", ticket.query(), Value::Object(kb));
        let call = CapabilityCall::new(COMMON, "solution_evaluation", eval);
        let result = invoke_logged(ticket, ctx, self.name(), call).await?;

        let score = read_score(&result)?;
        let threshold = ctx.config.escalation_threshold;
        let decision = Decision::from_score(score, threshold);
        ticket.record_decision(score, decision)?;
        info!(score, threshold, %decision, "decision gate");

        if decision == Decision::Escalated {
            let call = CapabilityCall::new(ATLAS, "escalation_decision", score.to_string());
            invoke_logged(ticket, ctx, self.name(), call).await?;
        }
        Ok(())
    }
}
