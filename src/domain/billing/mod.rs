//! Billing domain - webhook verification, normalization, and entitlement.
//!
//! Provider webhooks are verified against their raw bytes, normalized into
//! [`DomainEvent`]s, and recorded as immutable [`LedgerEntry`] facts.
//! [`resolve_entitlement`] derives access from those facts on demand.

mod entitlement;
mod event;
mod ip_allowlist;
mod ledger_entry;
pub mod normalizer;
mod provider;
mod signature;
mod stage;
mod webhook_errors;

pub use entitlement::{
    needs_period_boundary, resolve_entitlement, Entitlement, EntitlementPolicy, DEFAULT_LOOKBACK,
    DEFAULT_PERIOD_DAYS,
};
pub use event::{DomainEvent, EventDetails, LedgerEventType};
pub use ip_allowlist::IpAllowList;
pub use ledger_entry::{EventInstant, LedgerEntry, NaturalKey, OccurredAtSource};
pub use normalizer::{normalizer_for, EventNormalizer, PaddleNormalizer, PaystackNormalizer};
pub use provider::BillingProvider;
pub use signature::{PaddleSignature, PaddleSignatureHeader, PaystackSignature, SignatureScheme};
pub use stage::WebhookStage;
pub use webhook_errors::WebhookError;
