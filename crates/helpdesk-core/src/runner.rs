//! Workflow Engine: runs the stages in order and collects per-stage traces
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use crate::context::ExecutionContext;
use crate::data_model::StageTrace;
use crate::error::HelpdeskError;
use crate::stage::Stage;
use crate::ticket::TicketContext;

pub struct WorkflowEngine {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
}

impl WorkflowEngine {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join("→");

        Self { stages, pipeline_id }
    }

    /// Drive `ticket` through every stage.
    ///
    /// Stops at the first failing stage. Cancellation is observed before each
    /// stage and while a stage is suspended; the in-flight stage future is
    /// dropped, which abandons its pending capability calls.
    pub async fn run(
        &self,
        ticket: TicketContext,
        ctx: &ExecutionContext,
    ) -> Result<(TicketContext, Vec<StageTrace>), HelpdeskError> {
        let span = info_span!(
            "ticket_run",
            run_id = %ctx.run_id,
            ticket_id = %ticket.ticket_id(),
            pipeline = %self.pipeline_id,
        );
        self.run_stages(ticket, ctx).instrument(span).await
    }

    async fn run_stages(
        &self,
        mut ticket: TicketContext,
        ctx: &ExecutionContext,
    ) -> Result<(TicketContext, Vec<StageTrace>), HelpdeskError> {
        let mut traces = Vec::with_capacity(self.stages.len());

        for (idx, stage) in self.stages.iter().enumerate() {
            let name = stage.name();
            if ctx.is_cancelled() {
                warn!(stage = name, "run cancelled");
                return Err(HelpdeskError::Cancelled {
                    stage: name.to_string(),
                });
            }

            let start = Instant::now();
            let in_hash = ticket.fingerprint();
            let calls_before = ticket.call_log().len();
            info!(stage = name, step = idx + 1, "stage started");

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => None,
                result = stage.run(&mut ticket, ctx) => Some(result),
            };

            match outcome {
                None => {
                    warn!(stage = name, "run cancelled");
                    return Err(HelpdeskError::Cancelled {
                        stage: name.to_string(),
                    });
                }
                Some(Err(cause)) => {
                    warn!(stage = name, error = %cause, "stage failed");
                    return Err(HelpdeskError::StageFailure {
                        stage: name.to_string(),
                        cause,
                    });
                }
                Some(Ok(())) => {}
            }

            let calls = ticket.call_log().len() - calls_before;
            let latency_ms = start.elapsed().as_millis() as u64;
            info!(stage = name, calls, latency_ms, "stage finished");

            traces.push(StageTrace {
                stage: name.to_string(),
                in_hash,
                out_hash: ticket.fingerprint(),
                calls,
                deterministic: stage.deterministic(),
                latency_ms,
            });
        }

        Ok((ticket, traces))
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
