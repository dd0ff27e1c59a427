//! Webhook signature verification for billing providers.
//!
//! Both schemes hash the raw request bytes exactly as received. Re-serializing
//! the JSON before hashing changes key order and whitespace, so the body must
//! never be parsed before verification.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Verifies a provider's webhook signature over the raw body.
///
/// Implementations fail closed: any malformed input yields `false`.
pub trait SignatureScheme: Send + Sync {
    fn verify(&self, raw_body: &[u8], provided_signature: &str, shared_secret: &str) -> bool;
}

/// Paystack: hex HMAC-SHA512 of the body, keyed with the secret key.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaystackSignature;

impl PaystackSignature {
    /// Computes the hex signature Paystack would send for `raw_body`.
    pub fn sign(raw_body: &[u8], secret: &str) -> Option<String> {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(raw_body);
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

impl SignatureScheme for PaystackSignature {
    fn verify(&self, raw_body: &[u8], provided_signature: &str, shared_secret: &str) -> bool {
        if shared_secret.is_empty() {
            return false;
        }
        let Ok(provided) = hex::decode(provided_signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(shared_secret.as_bytes()) else {
            return false;
        };
        mac.update(raw_body);
        constant_time_compare(&mac.finalize().into_bytes(), &provided)
    }
}

/// Parsed `Paddle-Signature` header.
///
/// Format: `ts=<unix>;h1=<hex>[;h1=<hex>...]`. Several `h1` values appear
/// while a secret is being rotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddleSignatureHeader {
    /// The `ts` value exactly as sent; it is part of the signed payload.
    pub raw_timestamp: String,
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl PaddleSignatureHeader {
    pub fn parse(header: &str) -> Option<Self> {
        let mut raw_timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(';') {
            let (key, value) = part.trim().split_once('=')?;
            match key {
                "ts" => raw_timestamp = Some(value.to_string()),
                "h1" => signatures.push(hex::decode(value).ok()?),
                _ => {}
            }
        }

        let raw_timestamp = raw_timestamp?;
        let timestamp = raw_timestamp.parse().ok()?;
        if signatures.is_empty() {
            return None;
        }

        Some(Self {
            raw_timestamp,
            timestamp,
            signatures,
        })
    }
}

/// Paddle Billing: hex HMAC-SHA256 of `"<ts>:" + body`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaddleSignature {
    /// Reject signatures older than this many seconds. `None` disables the check.
    max_age_secs: Option<i64>,
}

impl PaddleSignature {
    pub fn new(max_age_secs: Option<i64>) -> Self {
        Self { max_age_secs }
    }

    /// Builds a full header value for `raw_body` signed at `timestamp`.
    pub fn sign(raw_body: &[u8], secret: &str, timestamp: i64) -> Option<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(format!("{}:", timestamp).as_bytes());
        mac.update(raw_body);
        Some(format!(
            "ts={};h1={}",
            timestamp,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    fn verify_at(&self, raw_body: &[u8], header: &str, secret: &str, now_secs: i64) -> bool {
        if secret.is_empty() {
            return false;
        }
        let Some(header) = PaddleSignatureHeader::parse(header) else {
            return false;
        };
        if let Some(max_age) = self.max_age_secs {
            let Some(age) = now_secs.checked_sub(header.timestamp).map(i64::unsigned_abs) else {
                return false;
            };
            if age > max_age.unsigned_abs() {
                return false;
            }
        }
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(header.raw_timestamp.as_bytes());
        mac.update(b":");
        mac.update(raw_body);
        let expected = mac.finalize().into_bytes();

        header
            .signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate))
    }
}

impl SignatureScheme for PaddleSignature {
    fn verify(&self, raw_body: &[u8], provided_signature: &str, shared_secret: &str) -> bool {
        self.verify_at(
            raw_body,
            provided_signature,
            shared_secret,
            chrono::Utc::now().timestamp(),
        )
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
