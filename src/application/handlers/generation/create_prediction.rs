//! CreatePredictionHandler - Submits an image generation job for an entitled caller.

use std::sync::Arc;

use super::gate::GenerationGate;
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{GenerationError, GenerationJob, GenerationRequest, ImageGenerator};

/// Smallest and largest accepted output edge, in pixels.
pub const MIN_DIMENSION: u32 = 64;
pub const MAX_DIMENSION: u32 = 2048;

#[derive(Debug, Clone)]
pub struct CreatePredictionCommand {
    pub user: AuthenticatedUser,
    pub request: GenerationRequest,
}

pub struct CreatePredictionHandler {
    gate: GenerationGate,
    generator: Arc<dyn ImageGenerator>,
}

impl CreatePredictionHandler {
    pub fn new(gate: GenerationGate, generator: Arc<dyn ImageGenerator>) -> Self {
        Self { gate, generator }
    }

    pub async fn handle(&self, cmd: CreatePredictionCommand) -> Result<GenerationJob, GenerationError> {
        let request = validate(cmd.request)?;

        self.gate.check(&cmd.user.email).await?;

        let job = self.generator.submit(request).await?;
        tracing::info!(user_id = %cmd.user.id, job_id = %job.id, "Generation job submitted");
        Ok(job)
    }
}

fn validate(mut request: GenerationRequest) -> Result<GenerationRequest, GenerationError> {
    request.prompt = request.prompt.trim().to_string();
    if request.prompt.is_empty() {
        return Err(GenerationError::InvalidRequest("Prompt is required".to_string()));
    }
    for (field, value) in [("width", request.width), ("height", request.height)] {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
            return Err(GenerationError::InvalidRequest(format!(
                "{} must be between {} and {}",
                field, MIN_DIMENSION, MAX_DIMENSION
            )));
        }
    }
    Ok(request)
}
