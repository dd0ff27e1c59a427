//! Paddle Billing event normalization (`{event_type, data}` envelope).

use serde_json::Value;

use super::{first_timestamp, i64_at, str_at, EventNormalizer};
use crate::domain::billing::event::{DomainEvent, EventDetails};
use crate::domain::billing::provider::BillingProvider;

#[derive(Debug, Clone, Copy, Default)]
pub struct PaddleNormalizer;

impl PaddleNormalizer {
    fn details(data: &Value, reference: Option<&str>, time_fields: &[&str]) -> EventDetails {
        EventDetails {
            customer_email: str_at(data, &["customer", "email"])
                .or_else(|| str_at(data, &["custom_data", "email"]))
                .unwrap_or_default()
                .to_string(),
            provider_reference: reference.unwrap_or_default().to_string(),
            // Paddle totals are strings in the currency's lowest denomination.
            amount: i64_at(data, &["details", "totals", "grand_total"]),
            currency: str_at(data, &["currency_code"]).map(str::to_string),
            status: str_at(data, &["status"]).unwrap_or_default().to_string(),
            occurred_at: first_timestamp(data, time_fields),
        }
    }

    fn cancellation_scheduled(data: &Value) -> bool {
        str_at(data, &["scheduled_change", "action"]) == Some("cancel")
    }
}

impl EventNormalizer for PaddleNormalizer {
    fn provider(&self) -> BillingProvider {
        BillingProvider::Paddle
    }

    fn normalize(&self, event_name: &str, data: &Value) -> Option<DomainEvent> {
        let id = str_at(data, &["id"]);

        let event = match event_name {
            "subscription.created" | "subscription.activated" => DomainEvent::SubscriptionCreated(
                Self::details(data, id, &["started_at", "created_at"]),
            ),
            "subscription.updated" if Self::cancellation_scheduled(data) => {
                DomainEvent::SubscriptionNonRenewing(Self::details(data, id, &["updated_at"]))
            }
            "subscription.canceled" => DomainEvent::SubscriptionExpired(Self::details(
                data,
                id,
                &["canceled_at", "updated_at"],
            )),
            "subscription.paused" => DomainEvent::SubscriptionDisabled(Self::details(
                data,
                id,
                &["paused_at", "updated_at"],
            )),
            "subscription.past_due" | "transaction.payment_failed" => {
                let reference = str_at(data, &["subscription_id"]).or(id);
                DomainEvent::PaymentFailed(Self::details(data, reference, &["updated_at"]))
            }
            "transaction.completed" => DomainEvent::PaymentSucceeded(Self::details(
                data,
                id,
                &["billed_at", "updated_at", "created_at"],
            )),
            other => {
                tracing::info!(provider = "paddle", event = other, "Unrecognized event ignored");
                return None;
            }
        };

        Some(event)
    }
}
