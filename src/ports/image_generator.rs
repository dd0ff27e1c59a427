//! Image generation port.
//!
//! Generation is asynchronous at the provider: `submit` returns a job that
//! is polled until it succeeds or fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prompt and output size for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Provider-side generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    /// Provider output (image URL or list of URLs) once succeeded.
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("an active subscription is required")]
    NotEntitled,

    #[error("generation job not found: {0}")]
    NotFound(String),

    /// Provider error message, surfaced to the caller.
    #[error("{0}")]
    Upstream(String),
}

/// Port for the image-generation provider.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn submit(&self, request: GenerationRequest) -> Result<GenerationJob, GenerationError>;

    async fn poll(&self, job_id: &str) -> Result<GenerationJob, GenerationError>;
}
