//! Immutable ledger entry and its natural key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::event::{DomainEvent, LedgerEventType};
use super::provider::BillingProvider;
use crate::domain::foundation::{normalize_email, EntryId, Timestamp, ValidationError};

/// Where an entry's `occurred_at` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurredAtSource {
    /// The provider payload carried an event time.
    Provider,
    /// No usable time in the payload; ingestion time was used instead.
    Ingestion,
}

impl OccurredAtSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccurredAtSource::Provider => "provider",
            OccurredAtSource::Ingestion => "ingestion",
        }
    }
}

impl FromStr for OccurredAtSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provider" => Ok(OccurredAtSource::Provider),
            "ingestion" => Ok(OccurredAtSource::Ingestion),
            other => Err(ValidationError::invalid_format(
                "occurred_at_source",
                format!("unknown source '{}'", other),
            )),
        }
    }
}

/// One provider event, recorded once and never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub provider: BillingProvider,
    pub event_type: LedgerEventType,
    pub provider_reference: String,
    pub customer_email: String,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub status: String,
    pub occurred_at: Timestamp,
    pub occurred_at_source: OccurredAtSource,
    pub recorded_at: Timestamp,
    pub raw_payload: serde_json::Value,
}

impl LedgerEntry {
    /// Builds a new entry from a normalized event.
    ///
    /// A missing payload time falls back to `recorded_at`.
    pub fn from_event(
        provider: BillingProvider,
        event: DomainEvent,
        raw_payload: serde_json::Value,
        recorded_at: Timestamp,
    ) -> Self {
        let event_type = event.event_type();
        let details = event.into_details();
        let (occurred_at, occurred_at_source) = match details.occurred_at {
            Some(ts) => (ts, OccurredAtSource::Provider),
            None => (recorded_at, OccurredAtSource::Ingestion),
        };

        Self {
            id: EntryId::new(),
            provider,
            event_type,
            provider_reference: details.provider_reference,
            customer_email: normalize_email(&details.customer_email),
            amount: details.amount,
            currency: details.currency,
            status: details.status,
            occurred_at,
            occurred_at_source,
            recorded_at,
            raw_payload,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        let instant = match self.occurred_at_source {
            OccurredAtSource::Provider => EventInstant::At(self.occurred_at),
            OccurredAtSource::Ingestion => match delivery_id(self.provider, &self.raw_payload) {
                Some(id) => EventInstant::Delivery(id),
                None => EventInstant::Unknown,
            },
        };
        NaturalKey {
            provider: self.provider,
            provider_reference: self.provider_reference.clone(),
            event_type: self.event_type,
            instant,
        }
    }
}

/// Provider-assigned id of the delivered event: Paddle's envelope
/// `event_id`, Paystack's `data.id`. Redeliveries carry the same id.
fn delivery_id(provider: BillingProvider, raw_payload: &Value) -> Option<String> {
    let value = match provider {
        BillingProvider::Paddle => raw_payload.get("event_id"),
        BillingProvider::Paystack => raw_payload.pointer("/data/id"),
    }?;
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// What distinguishes one occurrence of an event from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventInstant {
    /// Event time from the payload.
    At(Timestamp),
    /// No payload time; the provider's delivery id.
    Delivery(String),
    /// Neither. Every such event for the same reference and type is one entry.
    Unknown,
}

/// Identity of a provider event for deduplication.
///
/// Rendered as `provider|reference|event_type|instant`, where `instant` is
/// the RFC 3339 event time, `id:<delivery id>`, or `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub provider: BillingProvider,
    pub provider_reference: String,
    pub event_type: LedgerEventType,
    pub instant: EventInstant,
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = match &self.instant {
            EventInstant::At(ts) => ts.to_rfc3339(),
            EventInstant::Delivery(id) => format!("id:{}", id),
            EventInstant::Unknown => "-".to_string(),
        };
        write!(
            f,
            "{}|{}|{}|{}",
            self.provider, self.provider_reference, self.event_type, at
        )
    }
}
