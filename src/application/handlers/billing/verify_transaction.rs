//! VerifyTransactionHandler - Reconciles a checkout reference into the ledger.
//!
//! The customer's browser returns from checkout before (or after) the
//! `charge.success` webhook lands. Verifying the reference directly lets
//! access start immediately. The entry is built from the same transaction
//! object the webhook carries, so both paths produce one natural key and the
//! ledger keeps a single entry.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use super::resolve_entitlement::EntitlementResolver;
use crate::domain::billing::{normalizer_for, BillingProvider, Entitlement, LedgerEntry};
use crate::domain::foundation::{normalize_email, AuthenticatedUser, Timestamp};
use crate::ports::{AppendResult, PaymentGateway, PaymentGatewayError, SubscriptionLedger};

#[derive(Debug, Clone)]
pub struct VerifyTransactionCommand {
    pub user: AuthenticatedUser,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct VerifyTransactionResult {
    pub reference: String,
    pub status: String,
    /// Set when a successful charge was reconciled.
    pub ledger: Option<AppendResult>,
    pub entitlement: Entitlement,
}

#[derive(Debug, Clone, Error)]
pub enum VerifyTransactionError {
    #[error("Transaction reference is required")]
    MissingReference,

    #[error("Transaction belongs to another customer")]
    EmailMismatch,

    #[error(transparent)]
    Gateway(#[from] PaymentGatewayError),

    #[error("Failed to record transaction: {0}")]
    Persistence(String),
}

pub struct VerifyTransactionHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn SubscriptionLedger>,
    resolver: EntitlementResolver,
}

impl VerifyTransactionHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn SubscriptionLedger>,
        resolver: EntitlementResolver,
    ) -> Self {
        Self {
            gateway,
            ledger,
            resolver,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyTransactionCommand,
    ) -> Result<VerifyTransactionResult, VerifyTransactionError> {
        let reference = cmd.reference.trim();
        if reference.is_empty() {
            return Err(VerifyTransactionError::MissingReference);
        }

        let tx = self.gateway.verify_transaction(reference).await?;

        if normalize_email(&tx.customer_email) != cmd.user.email {
            tracing::warn!(
                user_id = %cmd.user.id,
                reference = %tx.reference,
                "Verify attempted for another customer's transaction"
            );
            return Err(VerifyTransactionError::EmailMismatch);
        }

        let ledger = if tx.is_successful() {
            Some(self.reconcile(&tx.raw).await?)
        } else {
            tracing::info!(reference = %tx.reference, status = %tx.status, "Transaction not successful, nothing ledgered");
            None
        };

        let entitlement = self.resolver.resolve(&cmd.user.email, Timestamp::now()).await;

        Ok(VerifyTransactionResult {
            reference: tx.reference,
            status: tx.status,
            ledger,
            entitlement,
        })
    }

    async fn reconcile(&self, data: &serde_json::Value) -> Result<AppendResult, VerifyTransactionError> {
        let provider = BillingProvider::Paystack;
        let event = normalizer_for(provider)
            .normalize("charge.success", data)
            .ok_or_else(|| VerifyTransactionError::Persistence("unreadable transaction".to_string()))?;

        let raw = json!({ "event": "charge.success", "data": data });
        let entry = LedgerEntry::from_event(provider, event, raw, Timestamp::now());
        let natural_key = entry.natural_key().to_string();

        let result = self
            .ledger
            .append(entry)
            .await
            .map_err(|e| VerifyTransactionError::Persistence(e.to_string()))?;

        tracing::info!(%natural_key, entry_id = %result.entry_id(), "Verified charge reconciled");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::initialize_transaction::tests::MockPaymentGateway;
    use super::*;
    use crate::adapters::ledger::InMemorySubscriptionLedger;
    use crate::domain::billing::EntitlementPolicy;
    use crate::domain::foundation::UserId;
    use crate::ports::{IngestionJob, VerifiedTransaction};

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn paid_at() -> String {
        Timestamp::now().add_days(-1).to_rfc3339()
    }

    fn transaction(email: &str, status: &str, paid_at: &str) -> VerifiedTransaction {
        let raw = json!({
            "reference": "ref-1",
            "status": status,
            "amount": 500000,
            "currency": "NGN",
            "paid_at": paid_at,
            "customer": {"email": email}
        });
        VerifiedTransaction {
            reference: "ref-1".to_string(),
            status: status.to_string(),
            amount: Some(500_000),
            currency: Some("NGN".to_string()),
            customer_email: email.to_string(),
            paid_at: Timestamp::parse_rfc3339(paid_at),
            raw,
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("uid-1").unwrap(), "a@x.com", true)
    }

    fn handler(
        gateway: MockPaymentGateway,
        ledger: Arc<InMemorySubscriptionLedger>,
    ) -> VerifyTransactionHandler {
        let resolver = EntitlementResolver::new(ledger.clone(), EntitlementPolicy::default());
        VerifyTransactionHandler::new(Arc::new(gateway), ledger, resolver)
    }

    fn command(reference: &str) -> VerifyTransactionCommand {
        VerifyTransactionCommand {
            user: user(),
            reference: reference.to_string(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Reconciliation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn successful_transaction_grants_entitlement() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let gateway = MockPaymentGateway::with_transaction(transaction("a@x.com", "success", &paid_at()));

        let result = handler(gateway, ledger.clone()).handle(command("ref-1")).await.unwrap();

        assert!(matches!(result.ledger, Some(AppendResult::Inserted(_))));
        assert!(result.entitlement.active);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn verify_dedupes_against_webhook_charge() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let paid_at = paid_at();
        let tx = transaction("a@x.com", "success", &paid_at);

        // Same charge delivered by webhook first.
        let worker = crate::application::handlers::billing::LedgerWorker::new(
            ledger.clone(),
            Default::default(),
        );
        worker
            .process_job(IngestionJob {
                provider: BillingProvider::Paystack,
                event_name: "charge.success".to_string(),
                payload: json!({"event": "charge.success", "data": tx.raw.clone()}),
                received_at: Timestamp::now(),
            })
            .await;

        let result = handler(MockPaymentGateway::with_transaction(tx), ledger.clone())
            .handle(command("ref-1"))
            .await
            .unwrap();

        assert!(matches!(result.ledger, Some(AppendResult::AlreadyRecorded(_))));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn mixed_case_provider_email_matches_owner() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let gateway = MockPaymentGateway::with_transaction(transaction(" A@X.com", "success", &paid_at()));
        let owner = VerifyTransactionCommand {
            user: AuthenticatedUser::new(UserId::new("uid-1").unwrap(), "A@X.com", true),
            reference: "ref-1".to_string(),
        };

        let result = handler(gateway, ledger.clone()).handle(owner).await.unwrap();

        assert!(result.entitlement.active);
        assert_eq!(ledger.entries().await[0].customer_email, "a@x.com");
    }

    #[tokio::test]
    async fn failed_transaction_is_not_ledgered() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let gateway = MockPaymentGateway::with_transaction(transaction("a@x.com", "failed", &paid_at()));

        let result = handler(gateway, ledger.clone()).handle(command("ref-1")).await.unwrap();

        assert!(result.ledger.is_none());
        assert!(!result.entitlement.active);
        assert!(ledger.is_empty().await);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Rejection Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn other_customers_transaction_is_forbidden() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let gateway = MockPaymentGateway::with_transaction(transaction("b@x.com", "success", &paid_at()));

        let result = handler(gateway, ledger.clone()).handle(command("ref-1")).await;

        assert!(matches!(result, Err(VerifyTransactionError::EmailMismatch)));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn blank_reference_is_rejected() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let result = handler(MockPaymentGateway::new(), ledger).handle(command("  ")).await;

        assert!(matches!(result, Err(VerifyTransactionError::MissingReference)));
    }

    #[tokio::test]
    async fn unknown_reference_surfaces_gateway_rejection() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let result = handler(MockPaymentGateway::new(), ledger).handle(command("nope")).await;

        assert!(matches!(
            result,
            Err(VerifyTransactionError::Gateway(PaymentGatewayError::Rejected(_)))
        ));
    }
}
