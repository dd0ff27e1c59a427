//! Source-IP allow-listing for webhook deliveries.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::net::IpAddr;

use super::provider::BillingProvider;
use crate::domain::foundation::ValidationError;

static PAYSTACK_WEBHOOK_IPS: Lazy<Vec<IpAddr>> = Lazy::new(|| {
    parse_static(&["52.31.139.75", "52.49.173.169", "52.214.14.220"])
});

static PADDLE_WEBHOOK_IPS: Lazy<Vec<IpAddr>> = Lazy::new(|| {
    parse_static(&[
        "34.232.58.13",
        "34.195.105.136",
        "34.237.3.244",
        "35.155.119.135",
        "52.11.166.252",
        "34.212.5.7",
    ])
});

fn parse_static(ips: &[&str]) -> Vec<IpAddr> {
    ips.iter().filter_map(|ip| ip.parse().ok()).collect()
}

/// Addresses a provider is allowed to deliver webhooks from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAllowList {
    allowed: HashSet<IpAddr>,
    enforce: bool,
}

impl IpAllowList {
    pub fn new(allowed: impl IntoIterator<Item = IpAddr>, enforce: bool) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            enforce,
        }
    }

    /// The provider's published webhook addresses.
    pub fn published(provider: BillingProvider, enforce: bool) -> Self {
        let ips = match provider {
            BillingProvider::Paystack => PAYSTACK_WEBHOOK_IPS.iter(),
            BillingProvider::Paddle => PADDLE_WEBHOOK_IPS.iter(),
        };
        Self::new(ips.copied(), enforce)
    }

    /// Parses a comma-separated override list.
    pub fn parse(list: &str, enforce: bool) -> Result<Self, ValidationError> {
        let mut allowed = HashSet::new();
        for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let ip: IpAddr = raw
                .parse()
                .map_err(|_| ValidationError::invalid_format("allowed_ips", raw))?;
            allowed.insert(ip);
        }
        Ok(Self { allowed, enforce })
    }

    /// Accepts everything.
    pub fn disabled() -> Self {
        Self::new(Vec::new(), false)
    }

    pub fn is_enforced(&self) -> bool {
        self.enforce
    }

    /// True when the request may proceed to signature verification.
    pub fn permits(&self, client_ip: Option<IpAddr>) -> bool {
        if !self.enforce {
            return true;
        }
        match client_ip {
            Some(ip) => self.allowed.contains(&ip),
            None => false,
        }
    }
}
