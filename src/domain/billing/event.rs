//! Provider-neutral billing events.
//!
//! Each provider normalizer maps its own payload shapes into [`DomainEvent`];
//! nothing downstream of the normalizer sees provider-specific JSON except
//! the retained raw payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Event kinds recorded in the subscription ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEventType {
    #[serde(rename = "subscription.created")]
    SubscriptionCreated,
    #[serde(rename = "subscription.disabled")]
    SubscriptionDisabled,
    #[serde(rename = "subscription.non_renewing")]
    SubscriptionNonRenewing,
    #[serde(rename = "invoice.payment_failed")]
    InvoicePaymentFailed,
    #[serde(rename = "charge.success")]
    ChargeSuccess,
    #[serde(rename = "subscription.expired")]
    SubscriptionExpired,
}

impl LedgerEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEventType::SubscriptionCreated => "subscription.created",
            LedgerEventType::SubscriptionDisabled => "subscription.disabled",
            LedgerEventType::SubscriptionNonRenewing => "subscription.non_renewing",
            LedgerEventType::InvoicePaymentFailed => "invoice.payment_failed",
            LedgerEventType::ChargeSuccess => "charge.success",
            LedgerEventType::SubscriptionExpired => "subscription.expired",
        }
    }

    /// True for events that start a paid period.
    pub fn is_activating(&self) -> bool {
        matches!(
            self,
            LedgerEventType::ChargeSuccess | LedgerEventType::SubscriptionCreated
        )
    }

    /// True for events that end access immediately.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LedgerEventType::SubscriptionDisabled | LedgerEventType::SubscriptionExpired
        )
    }

    /// Activating or terminal: the event fixes where a paid period stands.
    pub fn is_period_boundary(&self) -> bool {
        self.is_activating() || self.is_terminal()
    }

    /// Every event type for which [`is_period_boundary`](Self::is_period_boundary) holds.
    pub const PERIOD_BOUNDARIES: [LedgerEventType; 4] = [
        LedgerEventType::ChargeSuccess,
        LedgerEventType::SubscriptionCreated,
        LedgerEventType::SubscriptionDisabled,
        LedgerEventType::SubscriptionExpired,
    ];
}

impl fmt::Display for LedgerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerEventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription.created" => Ok(LedgerEventType::SubscriptionCreated),
            "subscription.disabled" => Ok(LedgerEventType::SubscriptionDisabled),
            "subscription.non_renewing" => Ok(LedgerEventType::SubscriptionNonRenewing),
            "invoice.payment_failed" => Ok(LedgerEventType::InvoicePaymentFailed),
            "charge.success" => Ok(LedgerEventType::ChargeSuccess),
            "subscription.expired" => Ok(LedgerEventType::SubscriptionExpired),
            other => Err(ValidationError::invalid_format(
                "event_type",
                format!("unknown ledger event type '{}'", other),
            )),
        }
    }
}

/// Fields common to every normalized billing event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDetails {
    pub customer_email: String,
    pub provider_reference: String,
    /// Minor currency units (kobo, cents).
    pub amount: Option<i64>,
    pub currency: Option<String>,
    /// Provider-reported status, empty when absent.
    pub status: String,
    /// Event time taken from the payload, if the payload carried one.
    pub occurred_at: Option<Timestamp>,
}

/// A billing event after provider normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    SubscriptionCreated(EventDetails),
    SubscriptionDisabled(EventDetails),
    SubscriptionNonRenewing(EventDetails),
    SubscriptionExpired(EventDetails),
    PaymentSucceeded(EventDetails),
    PaymentFailed(EventDetails),
}

impl DomainEvent {
    /// The ledger event type this event is recorded as.
    pub fn event_type(&self) -> LedgerEventType {
        match self {
            DomainEvent::SubscriptionCreated(_) => LedgerEventType::SubscriptionCreated,
            DomainEvent::SubscriptionDisabled(_) => LedgerEventType::SubscriptionDisabled,
            DomainEvent::SubscriptionNonRenewing(_) => LedgerEventType::SubscriptionNonRenewing,
            DomainEvent::SubscriptionExpired(_) => LedgerEventType::SubscriptionExpired,
            DomainEvent::PaymentSucceeded(_) => LedgerEventType::ChargeSuccess,
            DomainEvent::PaymentFailed(_) => LedgerEventType::InvoicePaymentFailed,
        }
    }

    pub fn details(&self) -> &EventDetails {
        match self {
            DomainEvent::SubscriptionCreated(d)
            | DomainEvent::SubscriptionDisabled(d)
            | DomainEvent::SubscriptionNonRenewing(d)
            | DomainEvent::SubscriptionExpired(d)
            | DomainEvent::PaymentSucceeded(d)
            | DomainEvent::PaymentFailed(d) => d,
        }
    }

    pub fn into_details(self) -> EventDetails {
        match self {
            DomainEvent::SubscriptionCreated(d)
            | DomainEvent::SubscriptionDisabled(d)
            | DomainEvent::SubscriptionNonRenewing(d)
            | DomainEvent::SubscriptionExpired(d)
            | DomainEvent::PaymentSucceeded(d)
            | DomainEvent::PaymentFailed(d) => d,
        }
    }
}
