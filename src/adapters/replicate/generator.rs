//! Replicate prediction adapter for the `ImageGenerator` port.
//!
//! Predictions run asynchronously at Replicate. `submit` creates one and
//! `poll` reads its current state.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{GenerationError, GenerationJob, GenerationRequest, ImageGenerator, JobStatus};

pub const REPLICATE_API_BASE: &str = "https://api.replicate.com";

#[derive(Clone)]
pub struct ReplicateConfig {
    api_token: SecretString,
    model_version: String,
    base_url: String,
    /// Public host that receives prediction callbacks, if any.
    webhook_host: Option<String>,
    submit_attempts: u32,
    submit_retry_delay: Duration,
}

impl ReplicateConfig {
    pub fn new(api_token: SecretString, model_version: impl Into<String>) -> Self {
        Self {
            api_token,
            model_version: model_version.into(),
            base_url: REPLICATE_API_BASE.to_string(),
            webhook_host: None,
            submit_attempts: 3,
            submit_retry_delay: Duration::from_secs(1),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_webhook_host(mut self, host: Option<String>) -> Self {
        self.webhook_host = host.map(|h| h.trim_end_matches('/').to_string());
        self
    }

    pub fn with_submit_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.submit_attempts = attempts.max(1);
        self.submit_retry_delay = delay;
        self
    }

    fn webhook_url(&self) -> Option<String> {
        self.webhook_host
            .as_ref()
            .map(|host| format!("{}/api/webhooks/replicate", host))
    }
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct CreatePrediction<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_events_filter: Option<[&'static str; 2]>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<String>,
}

fn map_status(status: &str) -> JobStatus {
    match status {
        "succeeded" => JobStatus::Succeeded,
        "failed" | "canceled" => JobStatus::Failed,
        _ => JobStatus::Pending,
    }
}

impl From<Prediction> for GenerationJob {
    fn from(p: Prediction) -> Self {
        let error = p.error.and_then(|e| match e {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        GenerationJob {
            id: p.id,
            status: map_status(&p.status),
            output: p.output.filter(|o| !o.is_null()),
            error,
        }
    }
}

pub struct ReplicateImageGenerator {
    config: ReplicateConfig,
    http_client: reqwest::Client,
}

impl ReplicateImageGenerator {
    pub fn new(config: ReplicateConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config,
            http_client,
        }
    }

    /// Reads a prediction, turning non-2xx responses into provider errors.
    async fn read_prediction(response: reqwest::Response) -> Result<GenerationJob, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&text)
                .ok()
                .and_then(|e| e.detail)
                .unwrap_or_else(|| format!("Replicate returned {}: {}", status, text));
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(GenerationError::NotFound(message));
            }
            return Err(GenerationError::Upstream(message));
        }

        let prediction: Prediction = response.json().await.map_err(|e| {
            GenerationError::Upstream(format!("Failed to parse Replicate response: {}", e))
        })?;
        Ok(prediction.into())
    }
}

#[async_trait]
impl ImageGenerator for ReplicateImageGenerator {
    async fn submit(&self, request: GenerationRequest) -> Result<GenerationJob, GenerationError> {
        let url = format!("{}/v1/predictions", self.config.base_url);
        let webhook = self.config.webhook_url();
        let body = CreatePrediction {
            version: &self.config.model_version,
            input: PredictionInput {
                prompt: &request.prompt,
                width: request.width,
                height: request.height,
            },
            webhook_events_filter: webhook.as_ref().map(|_| ["start", "completed"]),
            webhook,
        };

        let mut attempt = 1;
        let response = loop {
            let result = self
                .http_client
                .post(&url)
                .bearer_auth(self.config.api_token.expose_secret())
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) => break response,
                Err(e) if attempt < self.config.submit_attempts => {
                    tracing::warn!(attempt, error = %e, "Replicate submit failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.config.submit_retry_delay).await;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Replicate submit failed");
                    return Err(GenerationError::Upstream(e.to_string()));
                }
            }
        };

        let job = Self::read_prediction(response).await?;
        tracing::info!(job_id = %job.id, "Prediction created");
        Ok(job)
    }

    async fn poll(&self, job_id: &str) -> Result<GenerationJob, GenerationError> {
        let url = format!("{}/v1/predictions/{}", self.config.base_url, job_id);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.api_token.expose_secret())
            .send()
            .await
            .map_err(|e| GenerationError::Upstream(e.to_string()))?;

        Self::read_prediction(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ReplicateConfig {
        ReplicateConfig::new(SecretString::new("r8_test".to_string()), "ac732df8")
    }

    #[test]
    fn statuses_collapse_to_three_states() {
        assert_eq!(map_status("starting"), JobStatus::Pending);
        assert_eq!(map_status("processing"), JobStatus::Pending);
        assert_eq!(map_status("succeeded"), JobStatus::Succeeded);
        assert_eq!(map_status("failed"), JobStatus::Failed);
        assert_eq!(map_status("canceled"), JobStatus::Failed);
    }

    #[test]
    fn prediction_maps_output_and_error() {
        let prediction: Prediction = serde_json::from_value(json!({
            "id": "gm3qorzdhgbfurvjtvhg6dckhu",
            "status": "succeeded",
            "output": ["https://replicate.delivery/out-0.png"],
            "error": null
        }))
        .unwrap();
        let job = GenerationJob::from(prediction);
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.output, Some(json!(["https://replicate.delivery/out-0.png"])));
        assert_eq!(job.error, None);

        let prediction: Prediction = serde_json::from_value(json!({
            "id": "x", "status": "failed", "error": "CUDA out of memory"
        }))
        .unwrap();
        let job = GenerationJob::from(prediction);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("CUDA out of memory"));
        assert_eq!(job.output, None);
    }

    #[test]
    fn webhook_is_omitted_without_host() {
        let config = config();
        assert_eq!(config.webhook_url(), None);

        let body = CreatePrediction {
            version: "v",
            input: PredictionInput { prompt: "a cat", width: 512, height: 512 },
            webhook: None,
            webhook_events_filter: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("webhook").is_none());
        assert_eq!(json["input"]["prompt"], "a cat");
    }

    #[test]
    fn webhook_url_targets_replicate_callback() {
        let config = config().with_webhook_host(Some("https://promptimage.app/".to_string()));
        assert_eq!(
            config.webhook_url().as_deref(),
            Some("https://promptimage.app/api/webhooks/replicate")
        );
    }

    #[test]
    fn submit_attempts_are_at_least_one() {
        let config = config().with_submit_retries(0, Duration::ZERO);
        assert_eq!(config.submit_attempts, 1);
    }
}
