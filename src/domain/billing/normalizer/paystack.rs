//! Paystack event normalization (`{event, data}` envelope).

use serde_json::Value;

use super::{first_timestamp, i64_at, str_at, EventNormalizer};
use crate::domain::billing::event::{DomainEvent, EventDetails};
use crate::domain::billing::provider::BillingProvider;

#[derive(Debug, Clone, Copy, Default)]
pub struct PaystackNormalizer;

impl PaystackNormalizer {
    fn details(data: &Value, reference: Option<&str>, time_fields: &[&str]) -> EventDetails {
        EventDetails {
            customer_email: str_at(data, &["customer", "email"])
                .unwrap_or_default()
                .to_string(),
            provider_reference: reference.unwrap_or_default().to_string(),
            amount: i64_at(data, &["amount"]).or_else(|| i64_at(data, &["plan", "amount"])),
            currency: str_at(data, &["currency"])
                .or_else(|| str_at(data, &["plan", "currency"]))
                .map(str::to_string),
            status: str_at(data, &["status"]).unwrap_or_default().to_string(),
            occurred_at: first_timestamp(data, time_fields),
        }
    }
}

impl EventNormalizer for PaystackNormalizer {
    fn provider(&self) -> BillingProvider {
        BillingProvider::Paystack
    }

    fn normalize(&self, event_name: &str, data: &Value) -> Option<DomainEvent> {
        let subscription_code = str_at(data, &["subscription_code"]);

        let event = match event_name {
            "subscription.create" => DomainEvent::SubscriptionCreated(Self::details(
                data,
                subscription_code,
                &["createdAt", "created_at"],
            )),
            "subscription.disable" => DomainEvent::SubscriptionDisabled(Self::details(
                data,
                subscription_code,
                &["cancelledAt", "updatedAt", "updated_at"],
            )),
            "subscription.not_renew" => DomainEvent::SubscriptionNonRenewing(Self::details(
                data,
                subscription_code,
                &["updatedAt", "updated_at"],
            )),
            "invoice.payment_failed" => {
                let reference = str_at(data, &["subscription", "subscription_code"])
                    .or_else(|| str_at(data, &["invoice_code"]));
                DomainEvent::PaymentFailed(Self::details(
                    data,
                    reference,
                    &["updated_at", "created_at", "createdAt"],
                ))
            }
            "charge.success" => DomainEvent::PaymentSucceeded(Self::details(
                data,
                str_at(data, &["reference"]),
                &["paid_at", "paidAt", "created_at", "createdAt"],
            )),
            other => {
                tracing::info!(provider = "paystack", event = other, "Unrecognized event ignored");
                return None;
            }
        };

        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::event::LedgerEventType;
    use crate::domain::foundation::Timestamp;
    use serde_json::json;

    fn normalize(event: &str, data: Value) -> Option<DomainEvent> {
        PaystackNormalizer.normalize(event, &data)
    }

    #[test]
    fn charge_success_maps_reference_amount_and_paid_at() {
        let event = normalize(
            "charge.success",
            json!({
                "reference": "T12345",
                "amount": 500000,
                "currency": "NGN",
                "status": "success",
                "paid_at": "2024-01-15T10:30:00.000Z",
                "created_at": "2024-01-15T10:29:00.000Z",
                "customer": {"email": "buyer@example.com"}
            }),
        )
        .unwrap();

        assert_eq!(event.event_type(), LedgerEventType::ChargeSuccess);
        let d = event.details();
        assert_eq!(d.provider_reference, "T12345");
        assert_eq!(d.customer_email, "buyer@example.com");
        assert_eq!(d.amount, Some(500_000));
        assert_eq!(d.currency.as_deref(), Some("NGN"));
        assert_eq!(d.status, "success");
        assert_eq!(d.occurred_at, Timestamp::parse_rfc3339("2024-01-15T10:30:00Z"));
    }

    #[test]
    fn subscription_create_uses_plan_amount() {
        let event = normalize(
            "subscription.create",
            json!({
                "subscription_code": "SUB_vsyqdmlzble3uii",
                "status": "active",
                "createdAt": "2024-01-15T10:30:00.000Z",
                "plan": {"amount": 50000, "currency": "NGN"},
                "customer": {"email": "a@x.com"}
            }),
        )
        .unwrap();

        assert_eq!(event.event_type(), LedgerEventType::SubscriptionCreated);
        let d = event.details();
        assert_eq!(d.provider_reference, "SUB_vsyqdmlzble3uii");
        assert_eq!(d.amount, Some(50_000));
        assert_eq!(d.currency.as_deref(), Some("NGN"));
        assert!(d.occurred_at.is_some());
    }

    #[test]
    fn subscription_disable_and_not_renew_map() {
        let data = json!({"subscription_code": "SUB_1", "customer": {"email": "a@x.com"}});
        assert_eq!(
            normalize("subscription.disable", data.clone()).unwrap().event_type(),
            LedgerEventType::SubscriptionDisabled
        );
        assert_eq!(
            normalize("subscription.not_renew", data).unwrap().event_type(),
            LedgerEventType::SubscriptionNonRenewing
        );
    }

    #[test]
    fn payment_failed_prefers_nested_subscription_code() {
        let event = normalize(
            "invoice.payment_failed",
            json!({
                "invoice_code": "INV_1",
                "subscription": {"subscription_code": "SUB_9"},
                "customer": {"email": "a@x.com"}
            }),
        )
        .unwrap();
        assert_eq!(event.details().provider_reference, "SUB_9");

        let event = normalize("invoice.payment_failed", json!({"invoice_code": "INV_1"})).unwrap();
        assert_eq!(event.details().provider_reference, "INV_1");
    }

    #[test]
    fn missing_nested_objects_do_not_fail() {
        let event = normalize("subscription.create", json!({})).unwrap();
        let d = event.details();
        assert_eq!(d.customer_email, "");
        assert_eq!(d.provider_reference, "");
        assert_eq!(d.amount, None);
        assert_eq!(d.currency, None);
        assert_eq!(d.occurred_at, None);
    }

    #[test]
    fn far_future_paid_at_falls_back_to_other_times() {
        let data = json!({
            "reference": "T77",
            "paid_at": 8_210_266_876_000i64,
            "created_at": "2024-01-15T10:29:00.000Z",
            "customer": {"email": "a@x.com"}
        });
        let event = normalize("charge.success", data).unwrap();
        assert_eq!(
            event.details().occurred_at,
            Timestamp::parse_rfc3339("2024-01-15T10:29:00Z")
        );

        let event = normalize("charge.success", json!({"paid_at": 8_210_266_876_000i64})).unwrap();
        assert_eq!(event.details().occurred_at, None);
    }

    #[test]
    fn unrecognized_event_is_none() {
        assert!(normalize("transfer.success", json!({"reference": "x"})).is_none());
        assert!(normalize("", json!({})).is_none());
    }
}
