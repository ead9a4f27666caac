//! Prometheus counters for ticket outcomes, served on `/metrics`.
use helpdesk_core::{HelpdeskError, Summary};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    tickets: IntCounterVec,
    stage_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let tickets = IntCounterVec::new(
            Opts::new("helpdesk_tickets_total", "Tickets that reached Complete, by decision"),
            &["decision"],
        )?;
        let stage_failures = IntCounterVec::new(
            Opts::new("helpdesk_stage_failures_total", "Ticket runs aborted, by stage"),
            &["stage"],
        )?;
        registry.register(Box::new(tickets.clone()))?;
        registry.register(Box::new(stage_failures.clone()))?;

        Ok(Self {
            registry,
            tickets,
            stage_failures,
        })
    }

    pub fn record_summary(&self, summary: &Summary) {
        self.tickets
            .with_label_values(&[summary.decision.as_str()])
            .inc();
    }

    /// Rejected submissions are not counted; they never entered a stage.
    pub fn record_failure(&self, error: &HelpdeskError) {
        if let Some(stage) = error.stage() {
            self.stage_failures.with_label_values(&[stage]).inc();
        }
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
