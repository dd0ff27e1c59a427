//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Billing Ports
//!
//! - `SubscriptionLedger` - Append-only, idempotent store of billing events
//! - `IngestionQueue` - Hand-off from the webhook endpoint to the ledger worker
//! - `PaymentGateway` - Hosted checkout and transaction verification
//!
//! ## Other Ports
//!
//! - `SessionValidator` - Bearer token validation
//! - `ImageGenerator` - Image generation provider

mod image_generator;
mod ingestion_queue;
mod payment_gateway;
mod session_validator;
mod subscription_ledger;

pub use image_generator::{GenerationError, GenerationJob, GenerationRequest, ImageGenerator, JobStatus};
pub use ingestion_queue::{IngestionJob, IngestionQueue, QueueError};
pub use payment_gateway::{
    CheckoutSession, InitializeTransaction, PaymentGateway, PaymentGatewayError,
    VerifiedTransaction,
};
pub use session_validator::SessionValidator;
pub use subscription_ledger::{AppendResult, SubscriptionLedger};
