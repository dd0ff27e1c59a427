//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind address")]
    InvalidBindAddress,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Paystack secret key format")]
    InvalidPaystackKey,

    #[error("Invalid Paddle webhook secret format")]
    InvalidPaddleSecret,

    #[error("Invalid IP allow-list: {0}")]
    InvalidAllowList(String),

    #[error("Checkout amount must be positive")]
    InvalidCheckoutAmount,

    #[error("Subscription period must be at least one day")]
    InvalidPeriod,

    #[error("Entitlement lookback must be between 1 and 100")]
    InvalidLookback,

    #[error("Ingestion queue capacity must be positive")]
    InvalidQueueCapacity,

    #[error("Ingestion max_attempts must be positive")]
    InvalidMaxAttempts,

    #[error("Invalid backoff: {0}")]
    InvalidBackoff(String),

    #[error("Invalid Replicate API token format")]
    InvalidReplicateToken,
}
