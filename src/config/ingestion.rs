//! Webhook ingestion configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::handlers::billing::{Backoff, RetryPolicy};

/// Queue and retry settings for the ledger worker
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Jobs buffered between the endpoint and the worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// `linear` or `exponential`
    #[serde(default = "default_backoff")]
    pub backoff: String,
}

impl IngestionConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy, ValidationError> {
        let backoff: Backoff = self
            .backoff
            .parse()
            .map_err(|_| ValidationError::InvalidBackoff(self.backoff.clone()))?;

        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        self.retry_policy()?;
        Ok(())
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff: default_backoff(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_backoff() -> String {
    "exponential".to_string()
}
