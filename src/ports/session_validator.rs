//! Session validation port for identity tokens.
//!
//! Implementations must validate signature, issuer, audience, and expiry,
//! and must reject tokens without an email claim: the email is what
//! entitlement checks run against.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates bearer tokens and extracts user identity.
///
/// # Returns
///
/// * `Err(AuthError::InvalidToken)` - malformed token or bad signature
/// * `Err(AuthError::TokenExpired)` - valid signature but expired
/// * `Err(AuthError::MissingEmail)` - valid token without an email claim
/// * `Err(AuthError::ServiceUnavailable)` - key set unreachable
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
