//! Binary entrypoint for the helpdesk API server.
use helpdesk_api::{init_tracing, load_engine_config, run, AppState};
use helpdesk_core::FixedAnswer;
use helpdesk_mcp::ProviderRegistry;
use helpdesk_stages::TicketDesk;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Default listen address can be overridden with HELPDESK_ADDR
    let addr = std::env::var("HELPDESK_ADDR").unwrap_or_else(|_| "0.0.0.0:8787".to_string());
    let config = load_engine_config()?;
    let desk = TicketDesk::new(
        Arc::new(ProviderRegistry::reference()),
        Arc::new(FixedAnswer::reference()),
        config,
    );

    run(&addr, AppState::new(desk)?).await
}
