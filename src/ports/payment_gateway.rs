//! Payment gateway port for provider-hosted checkout.
//!
//! The gateway starts a checkout for a signed-in customer and later verifies
//! the resulting transaction reference. Verified charges are reconciled into
//! the subscription ledger by the application layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::Timestamp;

/// Request to start a hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeTransaction {
    pub email: String,
    /// Minor currency units.
    pub amount: i64,
    /// Provider plan code for recurring billing.
    pub plan: Option<String>,
    pub callback_url: Option<String>,
}

/// Hosted checkout created by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Provider's view of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedTransaction {
    pub reference: String,
    /// Provider transaction status (`success`, `failed`, `abandoned`, ...).
    pub status: String,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: String,
    pub paid_at: Option<Timestamp>,
    /// Transaction object as returned by the provider.
    pub raw: serde_json::Value,
}

impl VerifiedTransaction {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    /// The provider answered but refused the request.
    #[error("payment provider rejected request: {0}")]
    Rejected(String),

    /// The provider could not be reached or sent an unreadable reply.
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Port for payment provider checkout APIs.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<CheckoutSession, PaymentGatewayError>;

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<VerifiedTransaction, PaymentGatewayError>;
}
