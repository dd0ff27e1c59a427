//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `PROMPTIMAGE` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use promptimage::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod entitlement;
mod error;
mod generation;
mod ingestion;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use entitlement::EntitlementConfig;
pub use error::{ConfigError, ValidationError};
pub use generation::GenerationConfig;
pub use ingestion::IngestionConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL ledger; in-memory when `url` is unset
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Firebase identity
    pub auth: AuthConfig,

    /// Paystack and Paddle
    pub payment: PaymentConfig,

    #[serde(default)]
    pub entitlement: EntitlementConfig,

    /// Webhook queue and ledger retry
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Replicate
    pub generation: GenerationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `PROMPTIMAGE` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// - `PROMPTIMAGE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PROMPTIMAGE__PAYMENT__PAYSTACK_SECRET_KEY=...` -> `payment.paystack_secret_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROMPTIMAGE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate(production)?;
        self.auth.validate()?;
        self.payment.validate(production)?;
        self.entitlement.validate()?;
        self.ingestion.validate()?;
        self.generation.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PROMPTIMAGE__AUTH__FIREBASE_PROJECT_ID",
        "PROMPTIMAGE__PAYMENT__PAYSTACK_SECRET_KEY",
        "PROMPTIMAGE__GENERATION__REPLICATE_API_TOKEN",
        "PROMPTIMAGE__GENERATION__MODEL_VERSION",
        "PROMPTIMAGE__SERVER__PORT",
        "PROMPTIMAGE__SERVER__ENVIRONMENT",
        "PROMPTIMAGE__DATABASE__URL",
        "PROMPTIMAGE__INGESTION__BACKOFF",
    ];

    fn set_minimal_env() {
        env::set_var("PROMPTIMAGE__AUTH__FIREBASE_PROJECT_ID", "promptimage-test");
        env::set_var("PROMPTIMAGE__PAYMENT__PAYSTACK_SECRET_KEY", "sk_test_xxx");
        env::set_var("PROMPTIMAGE__GENERATION__REPLICATE_API_TOKEN", "r8_xxx");
        env::set_var("PROMPTIMAGE__GENERATION__MODEL_VERSION", "ac732df8");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_minimal_env();
        for (k, v) in extra {
            env::set_var(k, v);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.auth.firebase_project_id, "promptimage-test");
        assert_eq!(config.payment.paystack_secret_key, "sk_test_xxx");
        assert!(config.database.url().is_none());
    }

    #[test]
    fn test_validate_minimal_config() {
        let config = load_with(&[]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.entitlement.lookback, 5);
        assert_eq!(config.entitlement.subscription_period_days, 30);
        assert_eq!(config.ingestion.queue_capacity, 1024);
        assert_eq!(config.ingestion.max_attempts, 3);
    }

    #[test]
    fn test_custom_server_port() {
        let config = load_with(&[("PROMPTIMAGE__SERVER__PORT", "3000")]).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_production_requires_database() {
        let config = load_with(&[("PROMPTIMAGE__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );
    }

    #[test]
    fn test_invalid_backoff_fails_validation() {
        let config = load_with(&[("PROMPTIMAGE__INGESTION__BACKOFF", "random")]).unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidBackoff(_))));
    }
}
