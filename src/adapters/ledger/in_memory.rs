//! In-memory subscription ledger.
//!
//! Used when no database URL is configured, and by tests. Entries live only
//! as long as the process.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::{LedgerEntry, LedgerEventType};
use crate::domain::foundation::{normalize_email, DomainError, EntryId};
use crate::ports::{AppendResult, SubscriptionLedger};

#[derive(Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    by_natural_key: HashMap<String, EntryId>,
}

/// Append-only ledger held behind a single `RwLock`.
///
/// The natural-key check and the insert happen under one write lock, so
/// concurrent duplicate appends store exactly one entry.
#[derive(Default)]
pub struct InMemorySubscriptionLedger {
    state: RwLock<LedgerState>,
}

impl InMemorySubscriptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    async fn newest_first(&self, email: &str, keep: impl Fn(&LedgerEntry) -> bool) -> Vec<LedgerEntry> {
        let email = normalize_email(email);
        let state = self.state.read().await;

        let mut matching: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| e.customer_email == email && keep(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.recorded_at.cmp(&a.recorded_at))
        });
        matching
    }

    // === Test Helpers ===

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All stored entries in insertion order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.state.read().await.entries.clone()
    }
}

#[async_trait]
impl SubscriptionLedger for InMemorySubscriptionLedger {
    async fn append(&self, entry: LedgerEntry) -> Result<AppendResult, DomainError> {
        let key = entry.natural_key().to_string();
        let mut state = self.state.write().await;

        if let Some(existing) = state.by_natural_key.get(&key) {
            return Ok(AppendResult::AlreadyRecorded(*existing));
        }

        let id = entry.id;
        state.by_natural_key.insert(key, id);
        state.entries.push(entry);
        Ok(AppendResult::Inserted(id))
    }

    async fn query_by_email(
        &self,
        email: &str,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        let mut matching = self.newest_first(email, |_| true).await;
        matching.truncate(limit);
        Ok(matching)
    }

    async fn latest_of_types(
        &self,
        email: &str,
        event_types: &[LedgerEventType],
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let matching = self
            .newest_first(email, |e| event_types.contains(&e.event_type))
            .await;
        Ok(matching.into_iter().next())
    }
}
