//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::paystack::PAYSTACK_API_BASE;
use crate::domain::billing::{BillingProvider, IpAllowList};

/// Payment configuration (Paystack checkout and webhooks, Paddle webhooks)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Paystack secret key; also the webhook signing secret
    #[serde(default)]
    pub paystack_secret_key: String,

    /// Paddle notification-set secret; the Paddle route is off without it
    pub paddle_webhook_secret: Option<String>,

    /// Reject webhooks from unlisted addresses (default: production only)
    pub enforce_ip_allowlist: Option<bool>,

    /// Comma-separated override of Paystack's published addresses
    pub paystack_allowed_ips: Option<String>,

    /// Comma-separated override of Paddle's published addresses
    pub paddle_allowed_ips: Option<String>,

    /// Maximum age of a Paddle signature timestamp
    pub paddle_signature_max_age_secs: Option<i64>,

    /// Where Paystack redirects after checkout
    pub callback_url: Option<String>,

    /// Checkout price in minor currency units
    #[serde(default = "default_checkout_amount")]
    pub checkout_amount: i64,

    /// Paystack plan code for recurring billing
    pub plan_code: Option<String>,

    #[serde(default = "default_paystack_base_url")]
    pub paystack_base_url: String,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.paystack_secret_key.starts_with("sk_test_")
    }

    /// Paddle secret when configured and non-blank.
    pub fn paddle_secret(&self) -> Option<&str> {
        self.paddle_webhook_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn enforce_allowlist(&self, production: bool) -> bool {
        self.enforce_ip_allowlist.unwrap_or(production)
    }

    /// Allow-list for `provider`: the configured override, else the published list.
    pub fn allow_list(
        &self,
        provider: BillingProvider,
        production: bool,
    ) -> Result<IpAllowList, ValidationError> {
        let enforce = self.enforce_allowlist(production);
        let configured = match provider {
            BillingProvider::Paystack => self.paystack_allowed_ips.as_deref(),
            BillingProvider::Paddle => self.paddle_allowed_ips.as_deref(),
        };

        match configured.map(str::trim).filter(|s| !s.is_empty()) {
            Some(list) => IpAllowList::parse(list, enforce)
                .map_err(|e| ValidationError::InvalidAllowList(e.to_string())),
            None => Ok(IpAllowList::published(provider, enforce)),
        }
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.paystack_secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__PAYSTACK_SECRET_KEY"));
        }
        if !self.paystack_secret_key.starts_with("sk_") {
            return Err(ValidationError::InvalidPaystackKey);
        }
        if let Some(secret) = self.paddle_secret() {
            if !secret.starts_with("pdl_ntfset_") {
                return Err(ValidationError::InvalidPaddleSecret);
            }
        }
        if self.checkout_amount <= 0 {
            return Err(ValidationError::InvalidCheckoutAmount);
        }
        self.allow_list(BillingProvider::Paystack, production)?;
        self.allow_list(BillingProvider::Paddle, production)?;
        Ok(())
    }
}

fn default_checkout_amount() -> i64 {
    500_000
}

fn default_paystack_base_url() -> String {
    PAYSTACK_API_BASE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaymentConfig {
        PaymentConfig {
            paystack_secret_key: "sk_test_xxx".to_string(),
            paddle_webhook_secret: None,
            enforce_ip_allowlist: None,
            paystack_allowed_ips: None,
            paddle_allowed_ips: None,
            paddle_signature_max_age_secs: None,
            callback_url: None,
            checkout_amount: default_checkout_amount(),
            plan_code: None,
            paystack_base_url: default_paystack_base_url(),
        }
    }

    #[test]
    fn test_valid_minimal_config() {
        let config = config();
        assert!(config.is_test_mode());
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_missing_paystack_key() {
        let config = PaymentConfig {
            paystack_secret_key: String::new(),
            ..config()
        };
        assert_eq!(
            config.validate(false),
            Err(ValidationError::MissingRequired("PAYMENT__PAYSTACK_SECRET_KEY"))
        );
    }

    #[test]
    fn test_paystack_key_prefix() {
        let config = PaymentConfig {
            paystack_secret_key: "pk_test_xxx".to_string(),
            ..config()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidPaystackKey));
    }

    #[test]
    fn test_paddle_secret_prefix() {
        let config = PaymentConfig {
            paddle_webhook_secret: Some("whsec_xxx".to_string()),
            ..config()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidPaddleSecret));
    }

    #[test]
    fn test_blank_paddle_secret_disables_paddle() {
        let config = PaymentConfig {
            paddle_webhook_secret: Some("  ".to_string()),
            ..config()
        };
        assert!(config.paddle_secret().is_none());
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_allowlist_enforced_by_default_in_production_only() {
        let config = config();
        assert!(config.enforce_allowlist(true));
        assert!(!config.enforce_allowlist(false));

        let config = PaymentConfig {
            enforce_ip_allowlist: Some(false),
            ..config
        };
        assert!(!config.enforce_allowlist(true));
    }

    #[test]
    fn test_allowlist_override() {
        let config = PaymentConfig {
            paystack_allowed_ips: Some("10.0.0.1, 10.0.0.2".to_string()),
            ..config()
        };
        let list = config.allow_list(BillingProvider::Paystack, true).unwrap();
        assert!(list.permits(Some("10.0.0.2".parse().unwrap())));
        assert!(!list.permits(Some("52.31.139.75".parse().unwrap())));
    }

    #[test]
    fn test_bad_allowlist_fails_validation() {
        let config = PaymentConfig {
            paddle_allowed_ips: Some("not-an-ip".to_string()),
            ..config()
        };
        assert!(matches!(
            config.validate(false),
            Err(ValidationError::InvalidAllowList(_))
        ));
    }
}
