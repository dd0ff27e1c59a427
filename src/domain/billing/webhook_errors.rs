//! Webhook error types for billing webhook ingestion.
//!
//! Status codes determine the provider's retry behaviour: 2xx acknowledges,
//! 4xx is never retried, 5xx is redelivered.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while receiving or ledgering a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No provider is configured under this route segment.
    #[error("Unknown webhook provider: {0}")]
    UnknownProvider(String),

    /// The provider's signature header was absent.
    #[error("Missing signature header")]
    MissingSignature,

    /// The request came from an address outside the provider's allow-list.
    #[error("Source address not allowed")]
    SourceNotAllowed,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Body is not a valid provider envelope.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The ingestion queue refused the job (full or closed).
    #[error("Ingestion queue unavailable: {0}")]
    QueueUnavailable(String),

    /// Ledger append failed after the event was acknowledged.
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl WebhookError {
    /// Returns true if the worker should retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Persistence(_))
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::UnknownProvider(_) => StatusCode::NOT_FOUND,

            WebhookError::SourceNotAllowed => StatusCode::FORBIDDEN,

            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::MalformedPayload(_) => StatusCode::BAD_REQUEST,

            WebhookError::QueueUnavailable(_) | WebhookError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
