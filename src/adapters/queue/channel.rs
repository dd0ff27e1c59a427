//! Bounded tokio channel implementing the IngestionQueue port.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ports::{IngestionJob, IngestionQueue, QueueError};

/// Sending half of the ingestion channel. Cheap to clone.
#[derive(Clone)]
pub struct ChannelIngestionQueue {
    sender: mpsc::Sender<IngestionJob>,
}

impl ChannelIngestionQueue {
    /// Creates the queue and the receiver the ledger worker consumes.
    ///
    /// A capacity of zero is raised to one; tokio channels reject zero.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<IngestionJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl IngestionQueue for ChannelIngestionQueue {
    async fn enqueue(&self, job: IngestionJob) -> Result<(), QueueError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}
