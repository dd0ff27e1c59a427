//! Paystack checkout adapter.
//!
//! Implements `PaymentGateway` against the Paystack REST API with the secret
//! key as bearer token. Every Paystack response is wrapped in
//! `{status, message, data}`; `status: false` means the request was refused.
//!
//! ```ignore
//! let gateway = PaystackGateway::new(PaystackConfig::new(secret_key));
//! let session = gateway.initialize_transaction(request).await?;
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CheckoutSession, InitializeTransaction, PaymentGateway, PaymentGatewayError,
    VerifiedTransaction,
};

pub const PAYSTACK_API_BASE: &str = "https://api.paystack.co";

#[derive(Clone)]
pub struct PaystackConfig {
    secret_key: SecretString,
    base_url: String,
}

impl PaystackConfig {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            base_url: PAYSTACK_API_BASE.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Paystack response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    /// Paystack expects the amount as a string of minor units.
    amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    reference: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    customer: Option<TransactionCustomer>,
}

#[derive(Debug, Deserialize)]
struct TransactionCustomer {
    #[serde(default)]
    email: Option<String>,
}

/// Converts a verify response `data` object into the port type.
fn verified_from_data(raw: serde_json::Value) -> Result<VerifiedTransaction, PaymentGatewayError> {
    let data: TransactionData = serde_json::from_value(raw.clone()).map_err(|e| {
        PaymentGatewayError::Unavailable(format!("Unexpected Paystack transaction shape: {}", e))
    })?;

    Ok(VerifiedTransaction {
        reference: data.reference,
        status: data.status,
        amount: data.amount,
        currency: data.currency,
        customer_email: data
            .customer
            .and_then(|c| c.email)
            .unwrap_or_default(),
        paid_at: data.paid_at.as_deref().and_then(Timestamp::parse_rfc3339),
        raw,
    })
}

/// Unwraps a Paystack envelope into its `data`.
fn open_envelope<T>(envelope: Envelope<T>) -> Result<T, PaymentGatewayError> {
    if !envelope.status {
        return Err(PaymentGatewayError::Rejected(envelope.message));
    }
    envelope
        .data
        .ok_or_else(|| PaymentGatewayError::Unavailable("Paystack response had no data".to_string()))
}

pub struct PaystackGateway {
    config: PaystackConfig,
    http_client: reqwest::Client,
}

impl PaystackGateway {
    pub fn new(config: PaystackConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config,
            http_client,
        }
    }

    async fn read_envelope<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, PaymentGatewayError> {
        let status = response.status();
        let envelope: Envelope<T> = response.json().await.map_err(|e| {
            PaymentGatewayError::Unavailable(format!(
                "Failed to parse Paystack response ({}): {}",
                status, e
            ))
        })?;
        open_envelope(envelope)
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let url = format!("{}/transaction/initialize", self.config.base_url);
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount.to_string(),
            plan: request.plan.as_deref(),
            callback_url: request.callback_url.as_deref(),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentGatewayError::Unavailable(e.to_string()))?;

        let session: CheckoutSession = Self::read_envelope(response).await?;
        tracing::info!(reference = %session.reference, "Paystack checkout initialized");
        Ok(session)
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, PaymentGatewayError> {
        let url = format!("{}/transaction/verify/{}", self.config.base_url, reference);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| PaymentGatewayError::Unavailable(e.to_string()))?;

        let data: serde_json::Value = Self::read_envelope(response).await?;
        verified_from_data(data)
    }
}
