//! Runs the sample tickets against the mock providers and prints each summary.
use helpdesk_api::{init_tracing, load_engine_config};
use helpdesk_core::FixedAnswer;
use helpdesk_mcp::{sample_scenarios, ProviderRegistry};
use helpdesk_stages::TicketDesk;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let desk = TicketDesk::new(
        Arc::new(ProviderRegistry::reference().with_latency(Duration::from_millis(300))),
        Arc::new(FixedAnswer::reference().with_delay(Duration::from_secs(1))),
        load_engine_config()?,
    );

    for scenario in sample_scenarios() {
        info!(scenario = scenario.name, "submitting ticket");
        match desk.submit_ticket(scenario.fields).await {
            Ok(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
            Err(e) => error!(scenario = scenario.name, error = %e, "scenario failed"),
        }
    }

    Ok(())
}
