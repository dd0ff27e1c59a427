//! PromptImage - billing backend for a prompt-to-image service
//!
//! Ingests Paystack and Paddle webhooks into an immutable subscription
//! ledger and gates image generation on the entitlement derived from it.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
