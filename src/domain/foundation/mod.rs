//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the billing and generation domains.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{normalize_email, AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{EntryId, UserId};
pub use timestamp::Timestamp;
