//! Entitlement derivation over ledger entries.
//!
//! Entitlement is never stored. It is recomputed from the newest ledger
//! entries on every check, so out-of-order deliveries converge to the state
//! of the latest event by `occurred_at`.

use chrono::Duration;
use serde::Serialize;

use super::event::LedgerEventType;
use super::ledger_entry::LedgerEntry;
use crate::domain::foundation::Timestamp;

/// Default paid period granted by an activating event.
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Default number of newest entries consulted per check.
pub const DEFAULT_LOOKBACK: usize = 5;

/// Whether a customer may use paid features right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub customer_email: String,
    pub active: bool,
    pub valid_until: Option<Timestamp>,
}

impl Entitlement {
    pub fn inactive(customer_email: impl Into<String>) -> Self {
        Self {
            customer_email: customer_email.into(),
            active: false,
            valid_until: None,
        }
    }

    /// Active through `paid_at + period`.
    ///
    /// A period end past the representable range fails closed.
    fn paid_through(customer_email: &str, paid_at: Timestamp, period: Duration, now: Timestamp) -> Self {
        match paid_at.checked_add(period) {
            Some(valid_until) => Self {
                customer_email: customer_email.to_string(),
                active: now <= valid_until,
                valid_until: Some(valid_until),
            },
            None => {
                tracing::warn!(
                    customer_email,
                    paid_at = %paid_at.to_rfc3339(),
                    "Paid period end out of range, treating as not entitled"
                );
                Self::inactive(customer_email)
            }
        }
    }
}

/// Tunables for entitlement derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementPolicy {
    pub period: Duration,
    pub lookback: usize,
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self {
            period: Duration::days(DEFAULT_PERIOD_DAYS),
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

/// Derives the entitlement for `email` from its ledger entries.
///
/// Entries may arrive in any order. Latest wins by `occurred_at`, then by
/// `recorded_at`. Cancellation-style events keep access until the end of the
/// paid period before them, unless a terminal event came in between. When
/// `entries` holds no period boundary at all the result is inactive; callers
/// reading a bounded window should add the newest boundary entry first (see
/// [`needs_period_boundary`]).
pub fn resolve_entitlement(
    email: &str,
    entries: &[LedgerEntry],
    now: Timestamp,
    policy: &EntitlementPolicy,
) -> Entitlement {
    let mut sorted: Vec<&LedgerEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.recorded_at.cmp(&a.recorded_at))
    });

    match sorted.iter().find(|e| e.event_type.is_period_boundary()) {
        Some(boundary) if boundary.event_type.is_activating() => {
            Entitlement::paid_through(email, boundary.occurred_at, policy.period, now)
        }
        _ => Entitlement::inactive(email),
    }
}

/// True when `entries` is non-empty but holds neither an activating nor a
/// terminal event, so the paid period lies further back in the ledger.
pub fn needs_period_boundary(entries: &[LedgerEntry]) -> bool {
    !entries.is_empty() && !entries.iter().any(|e| e.event_type.is_period_boundary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::event::{DomainEvent, EventDetails};
    use crate::domain::billing::provider::BillingProvider;
    use serde_json::json;

    const EMAIL: &str = "a@x.com";

    fn t0() -> Timestamp {
        Timestamp::parse_rfc3339("2024-01-15T10:30:00Z").unwrap()
    }

    fn entry(event: fn(EventDetails) -> DomainEvent, at: Timestamp) -> LedgerEntry {
        entry_recorded(event, at, Timestamp::now())
    }

    fn entry_recorded(
        event: fn(EventDetails) -> DomainEvent,
        at: Timestamp,
        recorded_at: Timestamp,
    ) -> LedgerEntry {
        LedgerEntry::from_event(
            BillingProvider::Paystack,
            event(EventDetails {
                customer_email: EMAIL.to_string(),
                provider_reference: "SUB_1".to_string(),
                occurred_at: Some(at),
                ..Default::default()
            }),
            json!({}),
            recorded_at,
        )
    }

    fn resolve(entries: &[LedgerEntry], now: Timestamp) -> Entitlement {
        resolve_entitlement(EMAIL, entries, now, &EntitlementPolicy::default())
    }

    // ══════════════════════════════════════════════════════════════
    // Basic Rules
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn no_entries_is_inactive() {
        let ent = resolve(&[], t0());
        assert_eq!(ent, Entitlement::inactive(EMAIL));
    }

    #[test]
    fn created_is_active_within_thirty_days() {
        let entries = vec![entry(DomainEvent::SubscriptionCreated, t0())];

        let ent = resolve(&entries, t0().add_days(29));
        assert!(ent.active);
        assert_eq!(ent.valid_until, Some(t0().add_days(30)));

        let ent = resolve(&entries, t0().add_days(31));
        assert!(!ent.active);
        assert_eq!(ent.valid_until, Some(t0().add_days(30)));
    }

    #[test]
    fn charge_success_is_active_on_boundary() {
        let entries = vec![entry(DomainEvent::PaymentSucceeded, t0())];
        assert!(resolve(&entries, t0().add_days(30)).active);
    }

    #[test]
    fn disable_after_create_is_inactive() {
        let entries = vec![
            entry(DomainEvent::SubscriptionCreated, t0()),
            entry(DomainEvent::SubscriptionDisabled, t0().add_days(1)),
        ];

        let ent = resolve(&entries, t0().add_days(2));
        assert!(!ent.active);
        assert_eq!(ent.valid_until, None);
    }

    #[test]
    fn expired_is_inactive() {
        let entries = vec![
            entry(DomainEvent::PaymentSucceeded, t0()),
            entry(DomainEvent::SubscriptionExpired, t0().add_days(3)),
        ];
        assert!(!resolve(&entries, t0().add_days(4)).active);
    }

    // ══════════════════════════════════════════════════════════════
    // Paid-Period Rules
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn non_renewing_keeps_paid_period() {
        let entries = vec![
            entry(DomainEvent::PaymentSucceeded, t0()),
            entry(DomainEvent::SubscriptionNonRenewing, t0().add_days(5)),
        ];

        let ent = resolve(&entries, t0().add_days(10));
        assert!(ent.active);
        assert_eq!(ent.valid_until, Some(t0().add_days(30)));
        assert!(!resolve(&entries, t0().add_days(31)).active);
    }

    #[test]
    fn payment_failed_without_prior_payment_is_inactive() {
        let entries = vec![entry(DomainEvent::PaymentFailed, t0())];
        let ent = resolve(&entries, t0());
        assert!(!ent.active);
        assert_eq!(ent.valid_until, None);
    }

    #[test]
    fn payment_failed_uses_most_recent_payment() {
        let entries = vec![
            entry(DomainEvent::PaymentSucceeded, t0()),
            entry(DomainEvent::PaymentSucceeded, t0().add_days(30)),
            entry(DomainEvent::PaymentFailed, t0().add_days(59)),
        ];
        let ent = resolve(&entries, t0().add_days(59));
        assert_eq!(ent.valid_until, Some(t0().add_days(60)));
        assert!(ent.active);
    }

    #[test]
    fn disable_between_payment_and_failure_is_inactive() {
        let entries = vec![
            entry(DomainEvent::PaymentSucceeded, t0()),
            entry(DomainEvent::SubscriptionDisabled, t0().add_days(2)),
            entry(DomainEvent::PaymentFailed, t0().add_days(3)),
        ];
        assert!(!resolve(&entries, t0().add_days(4)).active);
    }

    #[test]
    fn repeated_payment_failures_keep_paid_period() {
        let mut entries = vec![entry(DomainEvent::PaymentSucceeded, t0())];
        for day in 1..=5 {
            entries.push(entry(DomainEvent::PaymentFailed, t0().add_days(day)));
        }

        let ent = resolve(&entries, t0().add_days(6));
        assert!(ent.active);
        assert_eq!(ent.valid_until, Some(t0().add_days(30)));
    }

    #[test]
    fn window_of_only_failures_needs_period_boundary() {
        let failures: Vec<LedgerEntry> = (1..=5)
            .map(|day| entry(DomainEvent::PaymentFailed, t0().add_days(day)))
            .collect();
        assert!(needs_period_boundary(&failures));
        assert!(!needs_period_boundary(&[]));

        let mut with_charge = failures;
        with_charge.push(entry(DomainEvent::PaymentSucceeded, t0()));
        assert!(!needs_period_boundary(&with_charge));
    }

    #[test]
    fn period_end_overflow_fails_closed() {
        let far = Timestamp::from_datetime(chrono::DateTime::<chrono::Utc>::MAX_UTC);
        let entries = vec![entry(DomainEvent::PaymentSucceeded, far)];

        let ent = resolve(&entries, t0());
        assert_eq!(ent, Entitlement::inactive(EMAIL));
    }

    #[test]
    fn custom_period_is_respected() {
        let policy = EntitlementPolicy {
            period: Duration::days(7),
            lookback: 5,
        };
        let entries = vec![entry(DomainEvent::PaymentSucceeded, t0())];
        let ent = resolve_entitlement(EMAIL, &entries, t0().add_days(8), &policy);
        assert!(!ent.active);
    }

    // ══════════════════════════════════════════════════════════════
    // Ordering
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn out_of_order_delivery_converges() {
        let created = entry(DomainEvent::SubscriptionCreated, t0());
        let disabled = entry(DomainEvent::SubscriptionDisabled, t0().add_days(1));

        let in_order = resolve(&[created.clone(), disabled.clone()], t0().add_days(2));
        let reversed = resolve(&[disabled, created], t0().add_days(2));

        assert_eq!(in_order, reversed);
        assert!(!reversed.active);
    }

    #[test]
    fn recorded_at_breaks_ties() {
        let recorded = Timestamp::now();
        let disabled = entry_recorded(DomainEvent::SubscriptionDisabled, t0(), recorded);
        let charged = entry_recorded(DomainEvent::PaymentSucceeded, t0(), recorded.add_days(1));

        let ent = resolve(&[disabled, charged], t0().add_days(1));
        assert!(ent.active);
    }

    #[test]
    fn resolver_is_deterministic() {
        let entries = vec![
            entry(DomainEvent::SubscriptionCreated, t0()),
            entry(DomainEvent::SubscriptionNonRenewing, t0().add_days(2)),
        ];
        let now = t0().add_days(3);
        assert_eq!(resolve(&entries, now), resolve(&entries, now));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let ent = Entitlement::inactive(EMAIL);
        let json = serde_json::to_value(&ent).unwrap();
        assert_eq!(json["customerEmail"], EMAIL);
        assert_eq!(json["active"], false);
        assert!(json["validUntil"].is_null());
    }
}
