//! Authentication configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Firebase identity configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Firebase project ID; expected token audience
    #[serde(default)]
    pub firebase_project_id: String,

    /// JWKS cache TTL in seconds
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
}

impl AuthConfig {
    pub fn jwks_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.jwks_cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.firebase_project_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__FIREBASE_PROJECT_ID"));
        }
        Ok(())
    }
}

fn default_jwks_cache_ttl() -> u64 {
    3600
}
