//! Authentication types for the domain layer.
//!
//! These types represent a signed-in user extracted from an identity token.
//! They have **no external dependencies** - the identity provider adapter
//! populates them via the `SessionValidator` port.

use super::UserId;
use thiserror::Error;

/// Authenticated user extracted from a validated ID token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the identity provider.
    pub id: UserId,

    /// User's email address; entitlement checks run against it.
    pub email: String,

    /// Whether the identity provider has verified the email.
    pub email_verified: bool,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    ///
    /// The email is normalized to trimmed lowercase so it matches ledger keys.
    pub fn new(id: UserId, email: impl AsRef<str>, email_verified: bool) -> Self {
        Self {
            id,
            email: normalize_email(email.as_ref()),
            email_verified,
        }
    }
}

/// Canonical form of a customer email used for ledger keys and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token is valid but carries no email claim.
    #[error("Token has no email claim")]
    MissingEmail,

    /// The identity service could not be reached (JWKS fetch, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
