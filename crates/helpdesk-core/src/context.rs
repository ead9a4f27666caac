//! Execution Context: collaborators shared by every stage of one run
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::capability::CapabilityClient;
use crate::clarification::ClarificationSource;
use crate::config::EngineConfig;

#[derive(Clone)]
pub struct ExecutionContext {
    pub run_id: String,
    pub client: Arc<dyn CapabilityClient>,
    pub clarifier: Arc<dyn ClarificationSource>,
    pub config: Arc<EngineConfig>,
    pub cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(
        client: Arc<dyn CapabilityClient>,
        clarifier: Arc<dyn ClarificationSource>,
        config: EngineConfig,
    ) -> Self {
        Self::with_shared_config(client, clarifier, Arc::new(config))
    }

    pub fn with_shared_config(
        client: Arc<dyn CapabilityClient>,
        clarifier: Arc<dyn ClarificationSource>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            client,
            clarifier,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this run to an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
