//! Provider Registry: canned capability providers served in-process
use async_trait::async_trait;
use helpdesk_core::{providers, CapabilityClient, CapabilityError, Payload};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::oracle::ScoreOracle;

/// Ability whose result carries the solution score.
pub const SCORING_ABILITY: &str = "solution_evaluation";

static REFERENCE_RESPONSES: Lazy<Vec<(&'static str, &'static str, Value)>> = Lazy::new(|| {
    use helpdesk_core::providers::{ATLAS, COMMON};
    vec![
        (COMMON, "parse_request_text", json!({"structured_data": "Parsed query", "urgency": "high"})),
        (COMMON, "normalize_fields", json!({"normalized": true, "format": "standard"})),
        (COMMON, "add_flags_calculations", json!({"priority_score": 85, "sla_risk": "medium"})),
        (COMMON, "response_generation", json!({"message": "We're addressing your concern"})),
        (ATLAS, "extract_entities", json!({"product": "order", "issue": "delivery_delay"})),
        (ATLAS, "enrich_records", json!({"sla": "24h", "history": "2_previous_tickets"})),
        (ATLAS, "clarify_question", json!({"question": "Please provide order number"})),
        (ATLAS, "extract_answer", json!({"order_number": "12345", "date": "2024-01-15"})),
        (ATLAS, "knowledge_base_search", json!({"article": "DEL-442", "content": "3-5 business days"})),
        (ATLAS, "escalation_decision", json!({"action": "escalate", "assigned_to": "senior_agent"})),
        (ATLAS, "update_ticket", json!({"status": "in_progress", "priority": "high"})),
        (ATLAS, "close_ticket", json!({"status": "resolved", "resolution": "completed"})),
        (ATLAS, "execute_api_calls", json!({"api": "crm_update", "status": "success"})),
        (ATLAS, "trigger_notifications", json!({"notification": "email_sent", "to": "customer"})),
    ]
});

#[derive(Debug, Clone)]
enum Responder {
    Fixed(Payload),
    Score,
    Fail(CapabilityError),
}

/// In-process [`CapabilityClient`] with a fixed table of abilities per
/// provider. Holds no per-run state, so one registry can serve many
/// concurrent runs.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, BTreeMap<String, Responder>>,
    oracle: ScoreOracle,
    latency: Duration,
}

fn as_payload(value: &Value) -> Payload {
    value.as_object().cloned().unwrap_or_default()
}

impl ProviderRegistry {
    /// No providers at all
    pub fn empty() -> Self {
        Self {
            providers: BTreeMap::new(),
            oracle: ScoreOracle::default(),
            latency: Duration::ZERO,
        }
    }

    /// COMMON and ATLAS with the reference responses and a random scorer
    pub fn reference() -> Self {
        let registry = REFERENCE_RESPONSES
            .iter()
            .fold(Self::empty(), |registry, (provider, ability, value)| {
                registry.register(provider, ability, as_payload(value))
            });
        registry.insert(providers::COMMON, SCORING_ABILITY, Responder::Score)
    }

    fn insert(mut self, provider: &str, ability: &str, responder: Responder) -> Self {
        self.providers
            .entry(provider.to_string())
            .or_default()
            .insert(ability.to_string(), responder);
        self
    }

    /// Register (or replace) an ability that always returns `result`.
    pub fn register(self, provider: &str, ability: &str, result: Payload) -> Self {
        self.insert(provider, ability, Responder::Fixed(result))
    }

    /// Make an ability fail every call with `error`.
    pub fn failing(self, provider: &str, ability: &str, error: CapabilityError) -> Self {
        self.insert(provider, ability, Responder::Fail(error))
    }

    /// Drop an ability so calls to it fail with `NotFound`.
    pub fn without(mut self, provider: &str, ability: &str) -> Self {
        if let Some(abilities) = self.providers.get_mut(provider) {
            abilities.remove(ability);
        }
        self
    }

    pub fn with_oracle(mut self, oracle: ScoreOracle) -> Self {
        self.oracle = oracle;
        self
    }

    /// Shorthand for a fixed scoring oracle.
    pub fn with_score(self, score: u8) -> Self {
        self.with_oracle(ScoreOracle::Fixed(score))
    }

    /// Simulated network latency applied to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn abilities(&self, provider: &str) -> Vec<&str> {
        self.providers
            .get(provider)
            .map(|a| a.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::reference()
    }
}

#[async_trait]
impl CapabilityClient for ProviderRegistry {
    async fn invoke(
        &self,
        provider: &str,
        ability: &str,
        input: &Value,
    ) -> Result<Payload, CapabilityError> {
        let responder = self
            .providers
            .get(provider)
            .and_then(|abilities| abilities.get(ability))
            .ok_or_else(|| CapabilityError::not_found(provider, ability))?;

        debug!(provider, ability, input_len = input.to_string().len(), "mock capability");
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match responder {
            Responder::Fixed(result) => Ok(result.clone()),
            Responder::Score => {
                let mut result = Payload::new();
                result.insert("score".to_string(), json!(self.oracle.draw()));
                Ok(result)
            }
            Responder::Fail(error) => Err(error.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::providers::{ATLAS, COMMON};

    #[test]
    fn test_reference_table() {
        let registry = ProviderRegistry::reference();
        assert_eq!(registry.provider_names(), vec![ATLAS, COMMON]);
        assert_eq!(registry.abilities(COMMON).len(), 5);
        assert_eq!(registry.abilities(ATLAS).len(), 10);
        assert!(registry.abilities("NOPE").is_empty());
    }

    #[tokio::test]
    async fn test_fixed_response() {
        let registry = ProviderRegistry::reference();
        let result = registry
            .invoke(ATLAS, "clarify_question", &json!("where is my order"))
            .await
            .unwrap();
        assert_eq!(result["question"], json!("Please provide order number"));
    }

    #[tokio::test]
    async fn test_unknown_ability_is_not_found_every_time() {
        let registry = ProviderRegistry::reference();
        for _ in 0..3 {
            let err = registry.invoke(COMMON, "extract_entities", &Value::Null).await.unwrap_err();
            assert_eq!(err, CapabilityError::not_found(COMMON, "extract_entities"));
        }
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let err = ProviderRegistry::reference()
            .invoke("ZEUS", "parse_request_text", &Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_fixed_score() {
        let registry = ProviderRegistry::reference().with_score(95);
        let result = registry.invoke(COMMON, SCORING_ABILITY, &json!("q")).await.unwrap();
        assert_eq!(result["score"], json!(95));
    }

    #[tokio::test]
    async fn test_without_and_failing() {
        let unavailable = CapabilityError::Unavailable {
            provider: ATLAS.to_string(),
            reason: "maintenance".to_string(),
        };
        let registry = ProviderRegistry::reference()
            .without(COMMON, "parse_request_text")
            .failing(ATLAS, "close_ticket", unavailable.clone());

        assert!(matches!(
            registry.invoke(COMMON, "parse_request_text", &Value::Null).await,
            Err(CapabilityError::NotFound { .. })
        ));
        assert_eq!(
            registry.invoke(ATLAS, "close_ticket", &Value::Null).await,
            Err(unavailable)
        );
    }

    #[tokio::test]
    async fn test_additional_provider() {
        let mut result = Payload::new();
        result.insert("sentiment".to_string(), json!("frustrated"));
        let registry = ProviderRegistry::empty().register("HERMES", "sentiment", result);
        let out = registry.invoke("HERMES", "sentiment", &json!("angry text")).await.unwrap();
        assert_eq!(out["sentiment"], json!("frustrated"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applied() {
        let registry = ProviderRegistry::reference().with_latency(Duration::from_millis(300));
        let start = tokio::time::Instant::now();
        registry.invoke(ATLAS, "update_ticket", &Value::Null).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
