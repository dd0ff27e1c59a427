//! Entitlement configuration

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::billing::{EntitlementPolicy, DEFAULT_LOOKBACK, DEFAULT_PERIOD_DAYS};

#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementConfig {
    /// Days of access granted per activating event
    #[serde(default = "default_period_days")]
    pub subscription_period_days: i64,

    /// Newest ledger entries consulted per check
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

impl EntitlementConfig {
    pub fn policy(&self) -> EntitlementPolicy {
        EntitlementPolicy {
            period: Duration::days(self.subscription_period_days),
            lookback: self.lookback,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subscription_period_days < 1 {
            return Err(ValidationError::InvalidPeriod);
        }
        if self.lookback == 0 || self.lookback > 100 {
            return Err(ValidationError::InvalidLookback);
        }
        Ok(())
    }
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            subscription_period_days: default_period_days(),
            lookback: default_lookback(),
        }
    }
}

fn default_period_days() -> i64 {
    DEFAULT_PERIOD_DAYS
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}
