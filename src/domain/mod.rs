//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `billing` - Webhook verification, event normalization, ledger entries,
//!   and entitlement derivation

pub mod billing;
pub mod foundation;
