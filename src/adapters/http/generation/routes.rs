//! Axum router configuration for generation endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_prediction, get_prediction, replicate_callback, GenerationAppState};

/// Generation routes, mounted under `/api`.
///
/// - `POST /predictions` - Submit a job (auth + entitlement)
/// - `GET /predictions/:id` - Poll a job (auth + entitlement)
/// - `POST /webhooks/replicate` - Provider callback
pub fn generation_routes() -> Router<GenerationAppState> {
    Router::new()
        .route("/predictions", post(create_prediction))
        .route("/predictions/:id", get(get_prediction))
        .route("/webhooks/replicate", post(replicate_callback))
}
