//! Host identity helpers.

use std::net::{IpAddr, ToSocketAddrs};

/// Resolves `hostname` and returns its first non-loopback address,
/// preferring IPv4.
pub fn resolve_host_ip(hostname: &str) -> Option<String> {
    if hostname.is_empty() {
        return None;
    }
    let addrs: Vec<IpAddr> = (hostname, 0)
        .to_socket_addrs()
        .ok()?
        .map(|a| a.ip())
        .filter(|ip| !ip.is_loopback() && !ip.is_unspecified())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .map(IpAddr::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hostname() {
        assert_eq!(resolve_host_ip(""), None);
    }

    #[test]
    fn test_literal_address() {
        assert_eq!(resolve_host_ip("10.1.2.3").as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn test_loopback_is_skipped() {
        assert_eq!(resolve_host_ip("127.0.0.1"), None);
    }
}
