//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Firebase ID token validation (`SessionValidator`)
//! - `http` - axum routers, middleware, and error mapping
//! - `ledger` - In-memory `SubscriptionLedger`
//! - `paystack` - Paystack checkout API (`PaymentGateway`)
//! - `postgres` - PostgreSQL `SubscriptionLedger` and migrations
//! - `queue` - Bounded channel `IngestionQueue`
//! - `replicate` - Replicate predictions API (`ImageGenerator`)

pub mod auth;
pub mod http;
pub mod ledger;
pub mod paystack;
pub mod postgres;
pub mod queue;
pub mod replicate;
