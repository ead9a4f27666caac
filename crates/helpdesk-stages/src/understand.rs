use async_trait::async_trait;
use helpdesk_core::capability::invoke_all;
use helpdesk_core::providers::{ATLAS, COMMON};
use helpdesk_core::{CapabilityCall, ExecutionContext, Payload, Stage, StageError, TicketContext};
use serde_json::Value;

/// Parses the request text and extracts entities in parallel.
#[derive(Default)]
pub struct UnderstandStage;

#[async_trait]
impl Stage for UnderstandStage {
    fn name(&self) -> &'static str {
        "Understand"
    }

    async fn run(&self, ticket: &mut TicketContext, ctx: &ExecutionContext) -> Result<(), StageError> {
        let query = ticket.query().to_string();
        let mut results = invoke_all(
            ticket,
            ctx,
            self.name(),
            vec![
                CapabilityCall::new(COMMON, "parse_request_text", query.clone()),
                CapabilityCall::new(ATLAS, "extract_entities", query),
            ],
        )
        .await?
        .into_iter();

        let mut entities = Payload::new();
        for key in ["parsed", "entities"] {
            if let Some(result) = results.next() {
                entities.insert(key.to_string(), Value::Object(result));
            }
        }
        ticket.merge_entities(entities);
        Ok(())
    }
}
