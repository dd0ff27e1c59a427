//! Provider payload normalization.
//!
//! Each provider gets its own [`EventNormalizer`]. Normalizers never fail:
//! unknown event names produce `None`, and missing optional fields become
//! `None` or empty strings.

mod paddle;
mod paystack;

pub use paddle::PaddleNormalizer;
pub use paystack::PaystackNormalizer;

use serde_json::Value;

use super::event::DomainEvent;
use super::provider::BillingProvider;
use crate::domain::foundation::Timestamp;

/// Maps a provider event name and its `data` object to a domain event.
pub trait EventNormalizer: Send + Sync {
    fn provider(&self) -> BillingProvider;

    fn normalize(&self, event_name: &str, data: &Value) -> Option<DomainEvent>;
}

/// Returns the normalizer for `provider`.
pub fn normalizer_for(provider: BillingProvider) -> Box<dyn EventNormalizer> {
    match provider {
        BillingProvider::Paystack => Box::new(PaystackNormalizer),
        BillingProvider::Paddle => Box::new(PaddleNormalizer),
    }
}

/// Follows `path` through nested objects.
fn value_at<'a>(data: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(data, |current, key| current.get(key))
}

fn str_at<'a>(data: &'a Value, path: &[&str]) -> Option<&'a str> {
    value_at(data, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Integer at `path`, accepting JSON numbers or integer strings.
fn i64_at(data: &Value, path: &[&str]) -> Option<i64> {
    match value_at(data, path)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 2000-01-01T00:00:00Z. Earlier event times are rejected.
const EARLIEST_EVENT_SECS: i64 = 946_684_800;

/// 2100-01-01T00:00:00Z. Later event times (or millisecond values read as
/// seconds) are rejected.
const LATEST_EVENT_SECS: i64 = 4_102_444_800;

fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    let ts = match value {
        Value::String(s) => Timestamp::parse_rfc3339(s)
            .or_else(|| s.trim().parse::<i64>().ok().and_then(Timestamp::from_unix_secs)),
        Value::Number(n) => n.as_i64().and_then(Timestamp::from_unix_secs),
        _ => None,
    }?;
    (EARLIEST_EVENT_SECS..LATEST_EVENT_SECS)
        .contains(&ts.as_unix_secs())
        .then_some(ts)
}

/// First candidate field holding a usable timestamp.
fn first_timestamp(data: &Value, candidates: &[&str]) -> Option<Timestamp> {
    candidates
        .iter()
        .filter_map(|field| data.get(*field))
        .find_map(parse_timestamp)
}
