//! LedgerWorker - asynchronous half of webhook ingestion.
//!
//! Consumes verified jobs from the ingestion channel, normalizes them, and
//! appends them to the ledger with bounded retry. The provider has already
//! been acknowledged, so failures end in a log line rather than a response.
//!
//! ## Graceful Shutdown
//!
//! On shutdown the worker drains jobs already in the channel, then stops.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::receive_webhook::log_stage;
use crate::domain::billing::{normalizer_for, LedgerEntry, WebhookError, WebhookStage};
use crate::domain::foundation::{Timestamp, ValidationError};
use crate::ports::{AppendResult, IngestionJob, SubscriptionLedger};

/// Delay growth between append attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Linear,
    Exponential,
}

impl FromStr for Backoff {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Backoff::Linear),
            "exponential" => Ok(Backoff::Exponential),
            other => Err(ValidationError::invalid_format(
                "backoff",
                format!("expected 'linear' or 'exponential', got '{}'", other),
            )),
        }
    }
}

/// Bounded retry for ledger appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Ledgered(AppendResult),
    /// Event name not mapped by the provider's normalizer.
    Unrecognized,
    /// Normalized event had no customer email.
    MissingEmail,
    /// Append failed on every attempt.
    Dropped(String),
}

pub struct LedgerWorker {
    ledger: Arc<dyn SubscriptionLedger>,
    retry: RetryPolicy,
}

impl LedgerWorker {
    pub fn new(ledger: Arc<dyn SubscriptionLedger>, retry: RetryPolicy) -> Self {
        Self { ledger, retry }
    }

    /// Runs until the channel closes or shutdown is signalled.
    pub async fn run(
        self,
        mut jobs: mpsc::Receiver<IngestionJob>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!("Ledger worker started");

        loop {
            tokio::select! {
                job = jobs.recv() => match job {
                    Some(job) => {
                        self.process_job(job).await;
                    }
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        jobs.close();
                        while let Some(job) = jobs.recv().await {
                            self.process_job(job).await;
                        }
                        break;
                    }
                }
            }
        }

        tracing::info!("Ledger worker stopped");
    }

    /// Normalizes and ledgers one job.
    pub async fn process_job(&self, job: IngestionJob) -> JobOutcome {
        let provider = job.provider;
        let normalizer = normalizer_for(provider);

        let Some(event) = normalizer.normalize(&job.event_name, job.data()) else {
            return JobOutcome::Unrecognized;
        };
        log_stage(provider, WebhookStage::Normalized, Some(&job.event_name));

        if event.details().customer_email.trim().is_empty() {
            tracing::warn!(
                provider = %provider,
                event = %job.event_name,
                reference = %event.details().provider_reference,
                "Dropping event without customer email"
            );
            return JobOutcome::MissingEmail;
        }

        let entry = LedgerEntry::from_event(provider, event, job.payload, Timestamp::now());
        let natural_key = entry.natural_key().to_string();

        match self.append_with_retry(entry).await {
            Ok(result) => {
                match result {
                    AppendResult::Inserted(id) => {
                        tracing::info!(%natural_key, entry_id = %id, "Ledger entry inserted")
                    }
                    AppendResult::AlreadyRecorded(id) => {
                        tracing::info!(%natural_key, entry_id = %id, "Duplicate event already recorded")
                    }
                }
                log_stage(provider, WebhookStage::Ledgered, Some(&job.event_name));
                JobOutcome::Ledgered(result)
            }
            Err(e) => {
                tracing::error!(
                    provider = %provider,
                    event = %job.event_name,
                    %natural_key,
                    error = %e,
                    "Persistence failure, event dropped"
                );
                JobOutcome::Dropped(e.to_string())
            }
        }
    }

    async fn append_with_retry(&self, entry: LedgerEntry) -> Result<AppendResult, WebhookError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.ledger.append(entry.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    let err = WebhookError::Persistence(e.to_string());
                    if attempt >= max_attempts || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Ledger append failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::InMemorySubscriptionLedger;
    use crate::domain::billing::{BillingProvider, LedgerEventType};
    use crate::domain::foundation::{DomainError, ErrorCode};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementation
    // ════════════════════════════════════════════════════════════════════════════

    /// Fails the first `failures` appends, then delegates.
    struct FlakyLedger {
        inner: InMemorySubscriptionLedger,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyLedger {
        fn new(failures: u32) -> Self {
            Self {
                inner: InMemorySubscriptionLedger::new(),
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl SubscriptionLedger for FlakyLedger {
        async fn append(&self, entry: LedgerEntry) -> Result<AppendResult, DomainError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(DomainError::new(ErrorCode::DatabaseError, "connection reset"));
            }
            self.inner.append(entry).await
        }

        async fn query_by_email(
            &self,
            email: &str,
            limit: usize,
        ) -> Result<Vec<LedgerEntry>, DomainError> {
            self.inner.query_by_email(email, limit).await
        }

        async fn latest_of_types(
            &self,
            email: &str,
            event_types: &[LedgerEventType],
        ) -> Result<Option<LedgerEntry>, DomainError> {
            self.inner.latest_of_types(email, event_types).await
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff: Backoff::Linear,
        }
    }

    fn charge_job(reference: &str) -> IngestionJob {
        IngestionJob {
            provider: BillingProvider::Paystack,
            event_name: "charge.success".to_string(),
            payload: json!({
                "event": "charge.success",
                "data": {
                    "reference": reference,
                    "amount": 500000,
                    "paid_at": "2024-01-15T10:30:00.000Z",
                    "customer": {"email": "a@x.com"}
                }
            }),
            received_at: Timestamp::now(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Retry Policy
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn linear_backoff_grows_by_base() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            backoff: Backoff::Linear,
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
    }

    #[test]
    fn exponential_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(2), Duration::from_millis(500));
        assert_eq!(policy.delay_after(3), Duration::from_millis(1000));
    }

    #[test]
    fn backoff_parses_case_insensitively() {
        assert_eq!("Linear".parse::<Backoff>().unwrap(), Backoff::Linear);
        assert_eq!("exponential".parse::<Backoff>().unwrap(), Backoff::Exponential);
        assert!("fibonacci".parse::<Backoff>().is_err());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Job Processing
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn charge_is_ledgered() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());

        let outcome = worker.process_job(charge_job("T1")).await;

        assert!(matches!(outcome, JobOutcome::Ledgered(AppendResult::Inserted(_))));
        let entries = ledger.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].raw_payload["data"]["reference"], "T1");
    }

    #[tokio::test]
    async fn replayed_job_is_already_recorded() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());

        worker.process_job(charge_job("T1")).await;
        let outcome = worker.process_job(charge_job("T1")).await;

        assert!(matches!(outcome, JobOutcome::Ledgered(AppendResult::AlreadyRecorded(_))));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn unrecognized_event_is_not_ledgered() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());

        let mut job = charge_job("T1");
        job.event_name = "transfer.success".to_string();

        assert_eq!(worker.process_job(job).await, JobOutcome::Unrecognized);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn event_without_email_is_dropped() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());

        let mut job = charge_job("T1");
        job.payload["data"]["customer"] = json!({});

        assert_eq!(worker.process_job(job).await, JobOutcome::MissingEmail);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let ledger = Arc::new(FlakyLedger::new(2));
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());

        let outcome = worker.process_job(charge_job("T1")).await;

        assert!(matches!(outcome, JobOutcome::Ledgered(AppendResult::Inserted(_))));
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_drop_the_event() {
        let ledger = Arc::new(FlakyLedger::new(10));
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());

        let outcome = worker.process_job(charge_job("T1")).await;

        assert!(matches!(outcome, JobOutcome::Dropped(_)));
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 3);
        assert!(ledger.inner.is_empty().await);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Run Loop
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn run_drains_queue_on_shutdown() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());
        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(charge_job("T1")).await.unwrap();
        tx.send(charge_job("T2")).await.unwrap();
        shutdown_tx.send(true).unwrap();

        worker.run(rx, shutdown_rx).await;

        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn run_stops_when_channel_closes() {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let worker = LedgerWorker::new(ledger.clone(), fast_retry());
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        tx.send(charge_job("T1")).await.unwrap();
        drop(tx);

        worker.run(rx, shutdown_rx).await;

        assert_eq!(ledger.len().await, 1);
    }
}
