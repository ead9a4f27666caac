//! Engine configuration
//!
//! Thresholds, timeouts and retry policy for a ticket run. Every field has a
//! default so a partial YAML document is enough to override one knob.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scores strictly below this value escalate (0..=100)
    pub escalation_threshold: u8,

    /// Upper bound for a single capability attempt
    pub call_timeout_ms: u64,

    /// How long the Ask stage waits for a human answer
    pub clarification_timeout_ms: u64,

    /// Retry policy for transient capability failures
    pub retry: RetryPolicy,
}

/// Exponential backoff for `Timeout` / `Unavailable` capability errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(32) as i32;
        let ms = (self.initial_backoff_ms as f64) * self.multiplier.powi(exp);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 90,
            call_timeout_ms: 5_000,
            clarification_timeout_ms: 300_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load config from YAML and validate it
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.escalation_threshold = threshold;
        self
    }

    pub fn with_clarification_timeout(mut self, timeout: Duration) -> Self {
        self.clarification_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn clarification_timeout(&self) -> Duration {
        Duration::from_millis(self.clarification_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.escalation_threshold > 100 {
            return Err(ConfigError::Invalid {
                field: "escalation_threshold",
                reason: format!("{} is outside 0..=100", self.escalation_threshold),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "call_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.clarification_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "clarification_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if !(self.retry.multiplier >= 1.0) {
            return Err(ConfigError::Invalid {
                field: "retry.multiplier",
                reason: format!("{} must be at least 1.0", self.retry.multiplier),
            });
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Invalid {
                field: "retry.initial_backoff_ms",
                reason: "must not exceed retry.max_backoff_ms".to_string(),
            });
        }
        Ok(())
    }
}
