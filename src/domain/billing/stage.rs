//! Pipeline stages a webhook passes through, used as a log field.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookStage {
    Received,
    IpChecked,
    SignatureVerified,
    Normalized,
    Ledgered,
    Acknowledged,
}

impl WebhookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStage::Received => "RECEIVED",
            WebhookStage::IpChecked => "IP_CHECKED",
            WebhookStage::SignatureVerified => "SIGNATURE_VERIFIED",
            WebhookStage::Normalized => "NORMALIZED",
            WebhookStage::Ledgered => "LEDGERED",
            WebhookStage::Acknowledged => "ACKNOWLEDGED",
        }
    }
}

impl fmt::Display for WebhookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
