//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    get_entitlement, initialize_transaction, receive_webhook, verify_transaction, BillingAppState,
};

/// Billing routes, mounted under `/api`.
///
/// ## Webhook Endpoints (no auth, signature verified)
/// - `POST /webhooks/:provider` - Paystack or Paddle webhook
///
/// ## User Endpoints (require authentication)
/// - `GET /entitlement` - Caller's entitlement
/// - `POST /paystack/initialize` - Start checkout
/// - `POST /paystack/verify` - Verify and reconcile a checkout reference
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/webhooks/:provider", post(receive_webhook))
        .route("/entitlement", get(get_entitlement))
        .route("/paystack/initialize", post(initialize_transaction))
        .route("/paystack/verify", post(verify_transaction))
}
