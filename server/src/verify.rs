//! Domain ownership verification

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

/// What a verifier found out about a domain
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub verified: bool,
    /// Resolved records, stored on the domain row
    pub records: Value,
}

#[async_trait]
pub trait DomainVerifier: Send + Sync {
    async fn verify(&self, domain: &str) -> Verification;
}

/// Names reserved for testing and documentation (RFC 2606 / RFC 6761)
pub fn is_reserved_test_domain(domain: &str) -> bool {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    matches!(
        domain.as_str(),
        "example.com" | "example.org" | "example.net"
    ) || [".localhost", ".test", ".example"]
        .iter()
        .any(|suffix| domain.ends_with(suffix))
}

/// Verifies a domain when the system resolver can resolve it
pub struct DnsVerifier {
    timeout: Duration,
}

impl DnsVerifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for DnsVerifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl DomainVerifier for DnsVerifier {
    async fn verify(&self, domain: &str) -> Verification {
        if is_reserved_test_domain(domain) {
            return Verification {
                verified: true,
                records: json!({ "reserved": true }),
            };
        }

        let addrs: Vec<IpAddr> =
            match tokio::time::timeout(self.timeout, tokio::net::lookup_host((domain, 80))).await {
                Ok(Ok(addrs)) => addrs.map(|a| a.ip()).collect(),
                Ok(Err(e)) => {
                    debug!("Lookup of {} failed: {}", domain, e);
                    Vec::new()
                }
                Err(_) => {
                    debug!("Lookup of {} timed out", domain);
                    Vec::new()
                }
            };

        let (v4, v6): (Vec<IpAddr>, Vec<IpAddr>) = addrs.into_iter().partition(IpAddr::is_ipv4);
        let to_strings = |ips: Vec<IpAddr>| ips.iter().map(ToString::to_string).collect::<Vec<_>>();

        Verification {
            verified: !v4.is_empty() || !v6.is_empty(),
            records: json!({ "A": to_strings(v4), "AAAA": to_strings(v6) }),
        }
    }
}
