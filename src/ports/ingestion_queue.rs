//! IngestionQueue port - hand-off between the webhook endpoint and the
//! ledger worker.
//!
//! The endpoint acknowledges the provider as soon as a verified job is
//! queued; normalization and ledgering happen asynchronously.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::BillingProvider;
use crate::domain::foundation::Timestamp;

/// A verified webhook awaiting normalization and ledgering.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub provider: BillingProvider,
    /// Provider event name (`event` or `event_type` field).
    pub event_name: String,
    /// Full parsed body, retained as the entry's raw payload.
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
}

impl IngestionJob {
    /// The envelope's `data` object, or `Null` when absent.
    pub fn data(&self) -> &serde_json::Value {
        self.payload
            .get("data")
            .unwrap_or(&serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("ingestion queue is full")]
    Full,

    #[error("ingestion queue is closed")]
    Closed,
}

/// Port for enqueueing verified webhooks.
#[async_trait]
pub trait IngestionQueue: Send + Sync {
    /// Enqueues a job without waiting for capacity.
    async fn enqueue(&self, job: IngestionJob) -> Result<(), QueueError>;
}
