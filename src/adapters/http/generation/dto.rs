//! Request and response bodies for generation endpoints.

use serde::{Deserialize, Serialize};

use crate::ports::{GenerationJob, GenerationRequest, JobStatus};

fn default_dimension() -> u32 {
    1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePredictionRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_dimension")]
    pub width: u32,
    #[serde(default = "default_dimension")]
    pub height: u32,
}

impl From<CreatePredictionRequest> for GenerationRequest {
    fn from(r: CreatePredictionRequest) -> Self {
        Self {
            prompt: r.prompt,
            width: r.width,
            height: r.height,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<GenerationJob> for PredictionResponse {
    fn from(job: GenerationJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            output: job.output,
            error: job.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_default_to_1024() {
        let req: CreatePredictionRequest = serde_json::from_str(r#"{"prompt": "a red fox"}"#).unwrap();
        assert_eq!(req.width, 1024);
        assert_eq!(req.height, 1024);
    }

    #[test]
    fn missing_prompt_deserializes_empty() {
        let req: CreatePredictionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.prompt.is_empty());
    }

    #[test]
    fn pending_response_omits_output() {
        let json = serde_json::to_value(PredictionResponse {
            id: "p1".to_string(),
            status: JobStatus::Pending,
            output: None,
            error: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": "p1", "status": "pending"}));
    }
}
