//! Request and response bodies for billing endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::VerifyTransactionResult;
use crate::domain::billing::Entitlement;
use crate::ports::CheckoutSession;

/// Acknowledgement returned to payment providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { status: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    pub customer_email: String,
    pub active: bool,
    /// RFC 3339, absent when not entitled.
    pub valid_until: Option<String>,
}

impl From<Entitlement> for EntitlementResponse {
    fn from(e: Entitlement) -> Self {
        Self {
            customer_email: e.customer_email,
            active: e.active,
            valid_until: e.valid_until.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

impl From<CheckoutSession> for CheckoutResponse {
    fn from(s: CheckoutSession) -> Self {
        Self {
            authorization_url: s.authorization_url,
            access_code: s.access_code,
            reference: s.reference,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub reference: String,
    pub status: String,
    pub entitlement: EntitlementResponse,
}

impl From<VerifyTransactionResult> for VerifyResponse {
    fn from(r: VerifyTransactionResult) -> Self {
        Self {
            reference: r.reference,
            status: r.status,
            entitlement: r.entitlement.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    #[test]
    fn webhook_ack_serializes_status_true() {
        let json = serde_json::to_value(WebhookAck::received()).unwrap();
        assert_eq!(json, serde_json::json!({"status": true}));
    }

    #[test]
    fn entitlement_response_uses_camel_case() {
        let entitlement = Entitlement {
            customer_email: "a@x.com".to_string(),
            active: true,
            valid_until: Timestamp::parse_rfc3339("2024-02-14T10:30:00Z"),
        };
        let json = serde_json::to_value(EntitlementResponse::from(entitlement)).unwrap();

        assert_eq!(json["customerEmail"], "a@x.com");
        assert_eq!(json["active"], true);
        assert_eq!(json["validUntil"], "2024-02-14T10:30:00.000Z");
    }

    #[test]
    fn inactive_entitlement_has_null_valid_until() {
        let json = serde_json::to_value(EntitlementResponse::from(Entitlement::inactive("a@x.com"))).unwrap();
        assert!(json["validUntil"].is_null());
    }

    #[test]
    fn verify_request_deserializes() {
        let req: VerifyRequest = serde_json::from_str(r#"{"reference": "ref-1"}"#).unwrap();
        assert_eq!(req.reference, "ref-1");
    }
}
