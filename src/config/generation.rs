//! Image generation configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::replicate::REPLICATE_API_BASE;

/// Replicate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub replicate_api_token: String,

    /// Model version hash passed to `POST /v1/predictions`
    #[serde(default)]
    pub model_version: String,

    /// Public host for progress callbacks; none when unset
    pub webhook_host: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_submit_attempts")]
    pub submit_attempts: u32,

    #[serde(default = "default_submit_retry_delay_ms")]
    pub submit_retry_delay_ms: u64,
}

impl GenerationConfig {
    pub fn submit_retry_delay(&self) -> Duration {
        Duration::from_millis(self.submit_retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.replicate_api_token.is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__REPLICATE_API_TOKEN"));
        }
        if !self.replicate_api_token.starts_with("r8_") {
            return Err(ValidationError::InvalidReplicateToken);
        }
        if self.model_version.trim().is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__MODEL_VERSION"));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    REPLICATE_API_BASE.to_string()
}

fn default_submit_attempts() -> u32 {
    3
}

fn default_submit_retry_delay_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str) -> GenerationConfig {
        GenerationConfig {
            replicate_api_token: token.to_string(),
            model_version: "ac732df8".to_string(),
            webhook_host: None,
            base_url: default_base_url(),
            submit_attempts: default_submit_attempts(),
            submit_retry_delay_ms: default_submit_retry_delay_ms(),
        }
    }

    #[test]
    fn valid_token_passes() {
        assert!(config("r8_abc").validate().is_ok());
    }

    #[test]
    fn token_prefix_is_checked() {
        assert_eq!(config("sk_abc").validate(), Err(ValidationError::InvalidReplicateToken));
    }

    #[test]
    fn missing_token_is_reported() {
        assert!(matches!(
            config("").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }
}
