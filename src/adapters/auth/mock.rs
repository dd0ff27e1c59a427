//! Mock session validator for tests and local development.
//!
//! ```ignore
//! let validator = MockSessionValidator::new().with_email("token-1", "buyer@example.com");
//! let user = validator.validate("token-1").await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Maps fixed tokens to users. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: HashMap<String, AuthenticatedUser>,
    force_error: Option<AuthError>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to `user`.
    pub fn with_user(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }

    /// Adds a valid token for a verified user with the given email.
    pub fn with_email(self, token: impl Into<String>, email: &str) -> Self {
        let token = token.into();
        let user = match UserId::new(format!("uid-{}", token)) {
            Ok(id) => AuthenticatedUser::new(id, email, true),
            Err(_) => return self,
        };
        self.with_user(token, user)
    }

    /// Forces every validation to fail with `error`.
    pub fn with_error(mut self, error: AuthError) -> Self {
        self.force_error = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = &self.force_error {
            return Err(error.clone());
        }
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}
