//! GetPredictionHandler - Polls a generation job.

use std::sync::Arc;

use super::gate::GenerationGate;
use crate::domain::foundation::AuthenticatedUser;
use crate::ports::{GenerationError, GenerationJob, ImageGenerator};

#[derive(Debug, Clone)]
pub struct GetPredictionQuery {
    pub user: AuthenticatedUser,
    pub job_id: String,
}

pub struct GetPredictionHandler {
    gate: GenerationGate,
    generator: Arc<dyn ImageGenerator>,
}

impl GetPredictionHandler {
    pub fn new(gate: GenerationGate, generator: Arc<dyn ImageGenerator>) -> Self {
        Self { gate, generator }
    }

    pub async fn handle(&self, query: GetPredictionQuery) -> Result<GenerationJob, GenerationError> {
        if query.job_id.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("Job id is required".to_string()));
        }

        self.gate.check(&query.user.email).await?;
        self.generator.poll(query.job_id.trim()).await
    }
}
