//! Helpdesk API /v1: REST endpoints
pub mod handlers;
pub mod metrics;
pub mod middleware;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use helpdesk_core::EngineConfig;
use helpdesk_stages::TicketDesk;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use metrics::Metrics;
pub use middleware::init_tracing;

/// Environment variable naming a YAML engine config file.
pub const CONFIG_ENV: &str = "HELPDESK_CONFIG";

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<TicketDesk>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(desk: TicketDesk) -> anyhow::Result<Self> {
        Ok(Self {
            desk: Arc::new(desk),
            metrics: Arc::new(Metrics::new().context("registering metrics")?),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/tickets", post(handlers::submit_ticket))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::trace())
        .layer(middleware::cors())
        .with_state(state)
}

pub async fn run(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!("helpdesk API listening on {}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Defaults unless `HELPDESK_CONFIG` points at a YAML file.
pub fn load_engine_config() -> anyhow::Result<EngineConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => load_engine_config_from(Path::new(&path)),
        Err(_) => Ok(EngineConfig::default()),
    }
}

pub fn load_engine_config_from(path: &Path) -> anyhow::Result<EngineConfig> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config =
        EngineConfig::from_yaml(&yaml).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), threshold = config.escalation_threshold, "loaded engine config");
    Ok(config)
}
