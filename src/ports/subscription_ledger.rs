//! SubscriptionLedger port - Append-only store of billing events.
//!
//! Providers redeliver webhooks, and the checkout verification path records
//! the same charges the webhook does. Both write through `append`, which is
//! idempotent on the entry's natural key.
//!
//! The port has no update or delete: corrections are new entries.

use async_trait::async_trait;

use crate::domain::billing::{LedgerEntry, LedgerEventType};
use crate::domain::foundation::{DomainError, EntryId};

/// Result of attempting to append a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendResult {
    /// The entry was stored.
    Inserted(EntryId),
    /// An entry with the same natural key already exists; carries its id.
    AlreadyRecorded(EntryId),
}

impl AppendResult {
    pub fn entry_id(&self) -> EntryId {
        match self {
            AppendResult::Inserted(id) | AppendResult::AlreadyRecorded(id) => *id,
        }
    }
}

/// Port for the immutable subscription ledger.
#[async_trait]
pub trait SubscriptionLedger: Send + Sync {
    /// Appends an entry unless one with the same natural key exists.
    ///
    /// Implementations must make the uniqueness check atomic with the insert
    /// (a unique constraint, or a single write lock).
    async fn append(&self, entry: LedgerEntry) -> Result<AppendResult, DomainError>;

    /// Returns up to `limit` entries for `email`, newest first.
    ///
    /// Ordered by `occurred_at` descending, then `recorded_at` descending.
    /// `email` is matched case-insensitively.
    async fn query_by_email(
        &self,
        email: &str,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, DomainError>;

    /// Returns the newest entry for `email` whose type is in `event_types`.
    ///
    /// Same ordering and email matching as `query_by_email`, with no window.
    async fn latest_of_types(
        &self,
        email: &str,
        event_types: &[LedgerEventType],
    ) -> Result<Option<LedgerEntry>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_is_available_for_both_outcomes() {
        let id = EntryId::new();
        assert_eq!(AppendResult::Inserted(id).entry_id(), id);
        assert_eq!(AppendResult::AlreadyRecorded(id).entry_id(), id);
    }

    #[test]
    fn subscription_ledger_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SubscriptionLedger>();
    }
}
