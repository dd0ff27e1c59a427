//! HTTP handlers for billing endpoints.
//!
//! These handlers connect axum routes to the billing command/query handlers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::dto::{CheckoutResponse, EntitlementResponse, VerifyRequest, VerifyResponse, WebhookAck};
use crate::adapters::http::error::ErrorResponse;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::billing::{
    EntitlementResolver, InitializeTransactionCommand, InitializeTransactionHandler,
    ReceiveWebhookCommand, ReceiveWebhookHandler, VerifyTransactionCommand,
    VerifyTransactionError, VerifyTransactionHandler,
};
use crate::domain::billing::{BillingProvider, WebhookError};
use crate::domain::foundation::Timestamp;
use crate::ports::PaymentGatewayError;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct BillingAppState {
    pub webhooks: Arc<ReceiveWebhookHandler>,
    pub resolver: EntitlementResolver,
    pub initialize: Arc<InitializeTransactionHandler>,
    pub verify: Arc<VerifyTransactionHandler>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/:provider - Receive a payment provider webhook
///
/// The body is taken as raw bytes: the signature covers the exact bytes sent.
pub async fn receive_webhook(
    State(state): State<BillingAppState>,
    Path(provider): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, WebhookApiError> {
    let signature = provider
        .parse::<BillingProvider>()
        .ok()
        .and_then(|p| headers.get(p.signature_header()))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = ReceiveWebhookCommand {
        provider,
        raw_body: body.to_vec(),
        signature,
        client_ip: client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
    };

    state.webhooks.handle(cmd).await?;

    Ok(Json(WebhookAck::received()))
}

/// Caller address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        })
        .or_else(|| peer.map(|addr| addr.ip()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Entitlement and Checkout
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/entitlement - Caller's current entitlement
pub async fn get_entitlement(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Json<EntitlementResponse> {
    let entitlement = state.resolver.resolve(&user.email, Timestamp::now()).await;
    Json(entitlement.into())
}

/// POST /api/paystack/initialize - Start a hosted checkout
pub async fn initialize_transaction(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutResponse>, CheckoutApiError> {
    let session = state
        .initialize
        .handle(InitializeTransactionCommand { user })
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/paystack/verify - Verify a reference and reconcile it into the ledger
pub async fn verify_transaction(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, CheckoutApiError> {
    let result = state
        .verify
        .handle(VerifyTransactionCommand {
            user,
            reference: request.reference,
        })
        .await?;
    Ok(Json(result.into()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Converts webhook errors to provider-facing responses.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let code = match &self.0 {
            WebhookError::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::SourceNotAllowed => "SOURCE_NOT_ALLOWED",
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            WebhookError::QueueUnavailable(_) => "QUEUE_UNAVAILABLE",
            WebhookError::Persistence(_) => "PERSISTENCE_FAILURE",
        };
        let message = if status.is_server_error() {
            "Webhook could not be accepted".to_string()
        } else {
            self.0.to_string()
        };
        ErrorResponse::with_code(code, message).into_response_with(status)
    }
}

/// Converts checkout errors to HTTP responses.
pub struct CheckoutApiError(VerifyTransactionError);

impl From<VerifyTransactionError> for CheckoutApiError {
    fn from(err: VerifyTransactionError) -> Self {
        Self(err)
    }
}

impl From<PaymentGatewayError> for CheckoutApiError {
    fn from(err: PaymentGatewayError) -> Self {
        Self(VerifyTransactionError::Gateway(err))
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.0 {
            VerifyTransactionError::MissingReference => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", self.0.to_string())
            }
            VerifyTransactionError::EmailMismatch => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", self.0.to_string())
            }
            VerifyTransactionError::Gateway(e) => {
                tracing::warn!(error = %e, "Payment provider call failed");
                let message = match e {
                    PaymentGatewayError::Rejected(m) | PaymentGatewayError::Unavailable(m) => m.clone(),
                };
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
            }
            VerifyTransactionError::Persistence(e) => {
                tracing::error!(error = %e, "Failed to reconcile transaction");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Failed to record transaction".to_string(),
                )
            }
        };
        ErrorResponse::with_code(code, message).into_response_with(status)
    }
}
