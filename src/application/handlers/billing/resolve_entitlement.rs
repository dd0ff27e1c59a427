//! EntitlementResolver - Query handler deriving a customer's entitlement.

use std::sync::Arc;

use crate::domain::billing::{
    needs_period_boundary, resolve_entitlement, Entitlement, EntitlementPolicy, LedgerEntry,
    LedgerEventType,
};
use crate::domain::foundation::{normalize_email, DomainError, Timestamp};
use crate::ports::SubscriptionLedger;

/// Reads the newest ledger entries for an email and derives entitlement.
///
/// When the lookback window holds only non-renewal or failed-payment events,
/// the newest activating or terminal entry is fetched as well. Fails closed:
/// a ledger error is logged and reported as inactive.
#[derive(Clone)]
pub struct EntitlementResolver {
    ledger: Arc<dyn SubscriptionLedger>,
    policy: EntitlementPolicy,
}

impl EntitlementResolver {
    pub fn new(ledger: Arc<dyn SubscriptionLedger>, policy: EntitlementPolicy) -> Self {
        Self { ledger, policy }
    }

    pub fn policy(&self) -> &EntitlementPolicy {
        &self.policy
    }

    pub async fn resolve(&self, email: &str, now: Timestamp) -> Entitlement {
        let email = normalize_email(email);
        if email.is_empty() {
            return Entitlement::inactive(email);
        }

        match self.relevant_entries(&email).await {
            Ok(entries) => resolve_entitlement(&email, &entries, now, &self.policy),
            Err(e) => {
                tracing::error!(customer_email = %email, error = %e, "Ledger read failed, treating as not entitled");
                Entitlement::inactive(email)
            }
        }
    }

    async fn relevant_entries(&self, email: &str) -> Result<Vec<LedgerEntry>, DomainError> {
        let mut entries = self.ledger.query_by_email(email, self.policy.lookback).await?;
        if needs_period_boundary(&entries) {
            let boundary = self
                .ledger
                .latest_of_types(email, &LedgerEventType::PERIOD_BOUNDARIES)
                .await?;
            entries.extend(boundary);
        }
        Ok(entries)
    }
}
