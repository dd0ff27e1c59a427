//! Billing handlers.
//!
//! ## Commands
//! - Receiving and verifying provider webhooks
//! - Ledgering queued webhook jobs (background worker)
//! - Starting and verifying Paystack checkouts
//!
//! ## Queries
//! - Resolving a customer's entitlement

mod initialize_transaction;
mod ledger_worker;
mod receive_webhook;
mod resolve_entitlement;
mod verify_transaction;

// Commands
pub use initialize_transaction::{
    CheckoutSettings, InitializeTransactionCommand, InitializeTransactionHandler,
};
pub use ledger_worker::{Backoff, JobOutcome, LedgerWorker, RetryPolicy};
pub use receive_webhook::{
    ProviderBinding, ReceiveWebhookCommand, ReceiveWebhookHandler, ReceiveWebhookResult,
};
pub use verify_transaction::{
    VerifyTransactionCommand, VerifyTransactionError, VerifyTransactionHandler,
    VerifyTransactionResult,
};

// Queries
pub use resolve_entitlement::EntitlementResolver;

