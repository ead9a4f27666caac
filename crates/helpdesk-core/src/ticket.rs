//! Ticket Context: the typed record threaded through every stage of one run.
//!
//! Identity fields are fixed at creation. Every optional field is write-once
//! except `extracted_entities`, which only grows, and the call log, which is
//! append-only.
use chrono::Utc;
use serde::Serialize;

use crate::data_model::{CallOutcome, CallRecord, Decision, Payload, Priority, TicketFields};
use crate::error::{ContextError, HelpdeskError};

#[derive(Debug, Clone, Serialize)]
pub struct TicketContext {
    ticket_id: String,
    customer_name: String,
    email: String,
    query: String,
    priority: Priority,
    extracted_entities: Option<Payload>,
    clarification_question: Option<String>,
    clarification_answer: Option<String>,
    kb_data: Option<Payload>,
    solution_score: Option<u8>,
    decision: Option<Decision>,
    generated_response: Option<Payload>,
    call_log: Vec<CallRecord>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), ContextError> {
    if slot.is_some() {
        return Err(ContextError::AlreadySet(field));
    }
    *slot = Some(value);
    Ok(())
}

impl TicketContext {
    /// Validate a submission and build a fresh context for it.
    pub fn from_fields(fields: TicketFields) -> Result<Self, HelpdeskError> {
        let priority = fields.validate()?;
        Ok(Self {
            ticket_id: fields.ticket_id.trim().to_string(),
            customer_name: fields.customer_name.trim().to_string(),
            email: fields.email.trim().to_string(),
            query: fields.query,
            priority,
            extracted_entities: None,
            clarification_question: None,
            clarification_answer: None,
            kb_data: None,
            solution_score: None,
            decision: None,
            generated_response: None,
            call_log: Vec::new(),
        })
    }

    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn extracted_entities(&self) -> Option<&Payload> {
        self.extracted_entities.as_ref()
    }

    pub fn clarification_question(&self) -> Option<&str> {
        self.clarification_question.as_deref()
    }

    pub fn clarification_answer(&self) -> Option<&str> {
        self.clarification_answer.as_deref()
    }

    pub fn kb_data(&self) -> Option<&Payload> {
        self.kb_data.as_ref()
    }

    pub fn solution_score(&self) -> Option<u8> {
        self.solution_score
    }

    pub fn decision(&self) -> Option<Decision> {
        self.decision
    }

    pub fn generated_response(&self) -> Option<&Payload> {
        self.generated_response.as_ref()
    }

    pub fn call_log(&self) -> &[CallRecord] {
        &self.call_log
    }

    /// Merge keys into the extracted entities, creating the map on first use.
    pub fn merge_entities(&mut self, entries: Payload) {
        self.extracted_entities
            .get_or_insert_with(Payload::new)
            .extend(entries);
    }

    pub fn set_clarification_question(&mut self, question: String) -> Result<(), ContextError> {
        set_once(&mut self.clarification_question, question, "clarification_question")
    }

    pub fn set_clarification_answer(&mut self, answer: String) -> Result<(), ContextError> {
        set_once(&mut self.clarification_answer, answer, "clarification_answer")
    }

    pub fn set_kb_data(&mut self, kb: Payload) -> Result<(), ContextError> {
        set_once(&mut self.kb_data, kb, "kb_data")
    }

    /// Record the gate outcome. Score and decision are written together so
    /// one is never present without the other.
    pub fn record_decision(&mut self, score: u8, decision: Decision) -> Result<(), ContextError> {
        if score > 100 {
            return Err(ContextError::ScoreOutOfRange(score));
        }
        if self.solution_score.is_some() {
            return Err(ContextError::AlreadySet("solution_score"));
        }
        if self.decision.is_some() {
            return Err(ContextError::AlreadySet("decision"));
        }
        self.solution_score = Some(score);
        self.decision = Some(decision);
        Ok(())
    }

    pub fn set_generated_response(&mut self, response: Payload) -> Result<(), ContextError> {
        set_once(&mut self.generated_response, response, "generated_response")
    }

    /// Append one entry to the call log and return its sequence number.
    pub fn push_call(
        &mut self,
        stage: &str,
        provider: &str,
        ability: &str,
        outcome: CallOutcome,
        attempts: u32,
        latency_ms: u64,
    ) -> usize {
        let seq = self.call_log.len();
        self.call_log.push(CallRecord {
            seq,
            stage: stage.to_string(),
            provider: provider.to_string(),
            ability: ability.to_string(),
            outcome,
            attempts,
            latency_ms,
            completed_at: Utc::now(),
        });
        seq
    }

    /// Fingerprint of the full context, used by stage traces.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        format!("blake3:{}", blake3::hash(&bytes))
    }
}
