//! ReceiveWebhookHandler - synchronous half of webhook ingestion.
//!
//! Checks the source address, verifies the signature over the raw body,
//! validates the envelope, and queues the job. Normalization and ledgering
//! happen in the `LedgerWorker`, after the provider has its `200`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::domain::billing::{
    BillingProvider, IpAllowList, PaddleSignature, PaystackSignature, SignatureScheme,
    WebhookError, WebhookStage,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{IngestionJob, IngestionQueue};

/// Verification settings for one provider.
pub struct ProviderBinding {
    scheme: Arc<dyn SignatureScheme>,
    secret: SecretString,
    allow_list: IpAllowList,
}

impl ProviderBinding {
    pub fn new(scheme: Arc<dyn SignatureScheme>, secret: SecretString, allow_list: IpAllowList) -> Self {
        Self {
            scheme,
            secret,
            allow_list,
        }
    }

    pub fn paystack(secret: SecretString, allow_list: IpAllowList) -> Self {
        Self::new(Arc::new(PaystackSignature), secret, allow_list)
    }

    pub fn paddle(secret: SecretString, allow_list: IpAllowList, max_age_secs: Option<i64>) -> Self {
        Self::new(Arc::new(PaddleSignature::new(max_age_secs)), secret, allow_list)
    }
}

/// Command carrying an inbound webhook delivery.
#[derive(Debug, Clone)]
pub struct ReceiveWebhookCommand {
    /// Route segment naming the provider.
    pub provider: String,
    /// Request body exactly as received.
    pub raw_body: Vec<u8>,
    /// Value of the provider's signature header.
    pub signature: Option<String>,
    pub client_ip: Option<IpAddr>,
}

/// Outcome of a successful receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveWebhookResult {
    pub provider: BillingProvider,
    pub event_name: String,
}

pub struct ReceiveWebhookHandler {
    bindings: HashMap<BillingProvider, ProviderBinding>,
    queue: Arc<dyn IngestionQueue>,
}

impl ReceiveWebhookHandler {
    pub fn new(queue: Arc<dyn IngestionQueue>) -> Self {
        Self {
            bindings: HashMap::new(),
            queue,
        }
    }

    /// Enables webhooks for `provider`.
    pub fn with_provider(mut self, provider: BillingProvider, binding: ProviderBinding) -> Self {
        self.bindings.insert(provider, binding);
        self
    }

    pub async fn handle(
        &self,
        cmd: ReceiveWebhookCommand,
    ) -> Result<ReceiveWebhookResult, WebhookError> {
        let provider: BillingProvider = cmd
            .provider
            .parse()
            .map_err(|_| WebhookError::UnknownProvider(cmd.provider.clone()))?;
        let binding = self
            .bindings
            .get(&provider)
            .ok_or_else(|| WebhookError::UnknownProvider(cmd.provider.clone()))?;

        log_stage(provider, WebhookStage::Received, None);

        // 1. Source address
        if !binding.allow_list.permits(cmd.client_ip) {
            tracing::warn!(
                provider = %provider,
                client_ip = ?cmd.client_ip,
                "Webhook rejected: source address not allowed"
            );
            return Err(WebhookError::SourceNotAllowed);
        }
        log_stage(provider, WebhookStage::IpChecked, None);

        // 2. Signature over the untouched body
        let signature = cmd
            .signature
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        if !binding
            .scheme
            .verify(&cmd.raw_body, signature, binding.secret.expose_secret())
        {
            tracing::warn!(provider = %provider, "Webhook rejected: invalid signature");
            return Err(WebhookError::InvalidSignature);
        }
        log_stage(provider, WebhookStage::SignatureVerified, None);

        // 3. Envelope
        let (event_name, payload) = parse_envelope(provider, &cmd.raw_body)?;

        // 4. Hand off
        let job = IngestionJob {
            provider,
            event_name: event_name.clone(),
            payload,
            received_at: Timestamp::now(),
        };
        self.queue.enqueue(job).await.map_err(|e| {
            tracing::error!(provider = %provider, event = %event_name, error = %e, "Failed to queue webhook");
            WebhookError::QueueUnavailable(e.to_string())
        })?;

        log_stage(provider, WebhookStage::Acknowledged, Some(&event_name));
        Ok(ReceiveWebhookResult {
            provider,
            event_name,
        })
    }
}

/// Checks the `{<event field>: string, data: object}` envelope.
fn parse_envelope(
    provider: BillingProvider,
    raw_body: &[u8],
) -> Result<(String, Value), WebhookError> {
    let payload: Value = serde_json::from_slice(raw_body)
        .map_err(|e| WebhookError::MalformedPayload(format!("invalid JSON: {}", e)))?;

    let field = provider.event_name_field();
    let event_name = payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| WebhookError::MalformedPayload(format!("missing '{}' field", field)))?
        .to_string();

    if !payload.get("data").map(Value::is_object).unwrap_or(false) {
        return Err(WebhookError::MalformedPayload(
            "missing 'data' object".to_string(),
        ));
    }

    Ok((event_name, payload))
}

pub(crate) fn log_stage(provider: BillingProvider, stage: WebhookStage, event: Option<&str>) {
    tracing::info!(
        provider = %provider,
        stage = %stage,
        event = event.unwrap_or(""),
        "Webhook stage"
    );
}
