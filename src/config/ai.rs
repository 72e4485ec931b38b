//! Model provider configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Model provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Provider API key
    pub api_key: Secret<String>,

    /// Base URL of the chat-completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Total attempts per completion (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff between retries, in seconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,

    /// Backoff ceiling, in seconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

impl AiConfig {
    /// Get the per-call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the initial backoff as Duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    /// Get the backoff ceiling as Duration
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        use secrecy::ExposeSecret;

        if self.api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AI__API_KEY"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidProviderTimeout);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        if self.initial_backoff_secs > self.max_backoff_secs {
            return Err(ValidationError::InvalidBackoffBounds);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1
}

fn default_max_backoff() -> u64 {
    10
}
