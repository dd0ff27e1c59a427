//! InitializeTransactionHandler - Starts a hosted Paystack checkout.

use std::sync::Arc;

use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{CheckoutSession, InitializeTransaction, PaymentGateway, PaymentGatewayError};

/// Price and plan applied to every checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Minor currency units.
    pub amount: i64,
    pub plan: Option<String>,
    pub callback_url: Option<String>,
}

/// Command to start a checkout for the signed-in customer.
#[derive(Debug, Clone)]
pub struct InitializeTransactionCommand {
    pub user: AuthenticatedUser,
}

pub struct InitializeTransactionHandler {
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl InitializeTransactionHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, settings: CheckoutSettings) -> Self {
        Self { gateway, settings }
    }

    /// The checkout email is always the authenticated one, so the resulting
    /// charge is ledgered under the caller's identity.
    pub async fn handle(
        &self,
        cmd: InitializeTransactionCommand,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let request = InitializeTransaction {
            email: cmd.user.email.clone(),
            amount: self.settings.amount,
            plan: self.settings.plan.clone(),
            callback_url: self.settings.callback_url.clone(),
        };

        let session = self.gateway.initialize_transaction(request).await?;

        tracing::info!(
            user_id = %cmd.user.id,
            reference = %session.reference,
            "Checkout initialized"
        );

        Ok(session)
    }
}
