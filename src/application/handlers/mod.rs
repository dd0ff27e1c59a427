//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;
pub mod generation;

pub use billing::{
    Backoff, CheckoutSettings, EntitlementResolver, InitializeTransactionCommand,
    InitializeTransactionHandler, JobOutcome, LedgerWorker, ProviderBinding,
    ReceiveWebhookCommand, ReceiveWebhookHandler, ReceiveWebhookResult, RetryPolicy,
    VerifyTransactionCommand, VerifyTransactionError, VerifyTransactionHandler,
    VerifyTransactionResult,
};
pub use generation::{
    CreatePredictionCommand, CreatePredictionHandler, GenerationGate, GetPredictionHandler,
    GetPredictionQuery,
};
