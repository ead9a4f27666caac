use async_trait::async_trait;
use helpdesk_core::capability::invoke_all;
use helpdesk_core::providers::{ATLAS, COMMON};
use helpdesk_core::{CapabilityCall, ExecutionContext, Payload, Stage, StageError, TicketContext};
use serde_json::Value;

/// Normalizes the extracted entities, enriches the customer record and
/// computes priority flags. The three calls are independent.
#[derive(Default)]
pub struct PrepareStage;

#[async_trait]
impl Stage for PrepareStage {
    fn name(&self) -> &'static str {
        "Prepare"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let entities = ticket
            .extracted_entities()
            .cloned()
            .ok_or(StageError::MissingField("extracted_entities"))?;

        let calls = vec![
            CapabilityCall::new(COMMON, "normalize_fields", Value::Object(entities)),
            CapabilityCall::new(ATLAS, "enrich_records", ticket.ticket_id()),
            CapabilityCall::new(COMMON, "add_flags_calculations", ticket.priority().as_str()),
        ];
        let results = invoke_all(ticket, ctx, self.name(), calls).await?;

        let merged: Payload = ["normalized", "enriched", "flags"]
            .into_iter()
            .zip(results)
            .map(|(key, result)| (key.to_string(), Value::Object(result)))
            .collect();
        ticket.merge_entities(merged);
        Ok(())
    }
}
