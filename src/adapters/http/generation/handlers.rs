//! HTTP handlers for generation endpoints.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::dto::{CreatePredictionRequest, PredictionResponse};
use crate::adapters::http::error::ErrorResponse;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::generation::{
    CreatePredictionCommand, CreatePredictionHandler, GetPredictionHandler, GetPredictionQuery,
};
use crate::ports::GenerationError;

#[derive(Clone)]
pub struct GenerationAppState {
    pub create: Arc<CreatePredictionHandler>,
    pub get: Arc<GetPredictionHandler>,
}

/// POST /api/predictions - Submit a generation job
pub async fn create_prediction(
    State(state): State<GenerationAppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreatePredictionRequest>,
) -> Result<impl IntoResponse, GenerationApiError> {
    let job = state
        .create
        .handle(CreatePredictionCommand {
            user,
            request: request.into(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PredictionResponse::from(job))))
}

/// GET /api/predictions/:id - Poll a generation job
pub async fn get_prediction(
    State(state): State<GenerationAppState>,
    RequireAuth(user): RequireAuth,
    Path(job_id): Path<String>,
) -> Result<Json<PredictionResponse>, GenerationApiError> {
    let job = state.get.handle(GetPredictionQuery { user, job_id }).await?;
    Ok(Json(job.into()))
}

/// POST /api/webhooks/replicate - Provider progress callback
///
/// Clients poll for results, so the callback is only logged.
pub async fn replicate_callback(Json(payload): Json<Value>) -> StatusCode {
    let job_id = payload.get("id").and_then(Value::as_str).unwrap_or("");
    let status = payload.get("status").and_then(Value::as_str).unwrap_or("");
    tracing::info!(job_id, status, "Generation progress callback");
    StatusCode::OK
}

/// Converts generation errors to HTTP responses.
pub struct GenerationApiError(GenerationError);

impl From<GenerationError> for GenerationApiError {
    fn from(err: GenerationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for GenerationApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            GenerationError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            GenerationError::NotEntitled => (StatusCode::PAYMENT_REQUIRED, "NOT_ENTITLED"),
            GenerationError::NotFound(_) => (StatusCode::NOT_FOUND, "JOB_NOT_FOUND"),
            GenerationError::Upstream(msg) => {
                tracing::error!(error = %msg, "Generation provider error");
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR")
            }
        };
        ErrorResponse::with_code(code, self.0.to_string()).into_response_with(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_entitled_is_payment_required() {
        let response = GenerationApiError(GenerationError::NotEntitled).into_response();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn upstream_is_internal_error() {
        let response = GenerationApiError(GenerationError::Upstream("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_request_is_bad_request() {
        let response =
            GenerationApiError(GenerationError::InvalidRequest("Prompt is required".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
