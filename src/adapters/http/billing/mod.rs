//! HTTP adapter for billing endpoints.
//!
//! - `POST /api/webhooks/:provider` - Paystack and Paddle webhooks
//! - `GET /api/entitlement` - Caller's entitlement
//! - `POST /api/paystack/initialize` - Start a hosted checkout
//! - `POST /api/paystack/verify` - Verify a checkout reference

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{client_ip, BillingAppState};
pub use routes::billing_routes;
