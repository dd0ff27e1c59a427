//! Subscription ledger adapters.
//!
//! - `InMemorySubscriptionLedger` - process-local store for development and tests
//! - `PostgresSubscriptionLedger` lives in `adapters::postgres`

mod in_memory;

pub use in_memory::InMemorySubscriptionLedger;
