//! Payment providers that deliver billing webhooks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// A payment provider whose events feed the subscription ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingProvider {
    Paystack,
    Paddle,
}

impl BillingProvider {
    /// Lowercase identifier used in routes, storage and natural keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingProvider::Paystack => "paystack",
            BillingProvider::Paddle => "paddle",
        }
    }

    /// Name of the request header carrying the webhook signature.
    pub fn signature_header(&self) -> &'static str {
        match self {
            BillingProvider::Paystack => "x-paystack-signature",
            BillingProvider::Paddle => "paddle-signature",
        }
    }

    /// Name of the envelope field holding the provider's event name.
    pub fn event_name_field(&self) -> &'static str {
        match self {
            BillingProvider::Paystack => "event",
            BillingProvider::Paddle => "event_type",
        }
    }
}

impl fmt::Display for BillingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paystack" => Ok(BillingProvider::Paystack),
            "paddle" => Ok(BillingProvider::Paddle),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown billing provider '{}'", other),
            )),
        }
    }
}
