//! Listen/remote address resolution.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::debug;

use super::error::{ResolveError, ResolveResult};

/// A resolved `host:port` address.
///
/// The host is either an IP literal or a hostname that failed forward
/// lookup and is left for the bind/dial path to surface. Produced once
/// per listen/remote spec at forwarder startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddr(String);

impl ResolvedAddr {
    fn new(addr: String) -> Self {
        Self(addr)
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResolvedAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedAddr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a listen or remote address spec.
///
/// A listen-side spec without a `:` is treated as a local interface
/// name and resolves to the interface's first IPv4 address with an
/// ephemeral port. Any other spec is split into host and port; an
/// empty host (`:8080`) is the all-interfaces wildcard and a
/// non-literal host is forward-resolved, preferring the first IPv4
/// result. A failed lookup falls back to the original spec so the
/// error surfaces later as a bind or dial failure.
///
/// Safe to call concurrently for independent specs.
///
/// # Errors
///
/// Returns an error for a malformed `host:port` spec or an interface
/// name that cannot be mapped to an IPv4 address.
pub async fn resolve(spec: &str, is_listen: bool) -> ResolveResult<ResolvedAddr> {
    if is_listen && !spec.contains(':') {
        return resolve_interface(spec);
    }

    let (host, port) = split_host_port(spec)?;

    if host.is_empty() {
        return Ok(ResolvedAddr::new(format!("0.0.0.0:{port}")));
    }

    if host.parse::<IpAddr>().is_ok() {
        return Ok(ResolvedAddr::new(spec.to_string()));
    }

    match lookup_first_ipv4(host).await {
        Some(ip) => Ok(ResolvedAddr::new(format!("{ip}:{port}"))),
        None => {
            debug!(spec, "hostname lookup failed, keeping original spec");
            Ok(ResolvedAddr::new(spec.to_string()))
        },
    }
}

/// Resolve an interface name to its first IPv4 address with port 0.
fn resolve_interface(name: &str) -> ResolveResult<ResolvedAddr> {
    let interfaces = if_addrs::get_if_addrs().map_err(ResolveError::Interfaces)?;

    let mut found = false;
    for iface in interfaces {
        if iface.name != name {
            continue;
        }
        found = true;
        if let IpAddr::V4(ip) = iface.ip() {
            return Ok(ResolvedAddr::new(format!("{ip}:0")));
        }
    }

    if found {
        Err(ResolveError::NoIpv4Address {
            name: name.to_string(),
        })
    } else {
        Err(ResolveError::InterfaceNotFound {
            name: name.to_string(),
        })
    }
}

/// Split a spec into host and port, handling bracketed IPv6 literals.
fn split_host_port(spec: &str) -> ResolveResult<(&str, &str)> {
    let invalid = || ResolveError::InvalidAddress {
        spec: spec.to_string(),
    };

    if let Some(rest) = spec.strip_prefix('[') {
        let (host, rest) = rest.split_once(']').ok_or_else(invalid)?;
        let port = rest.strip_prefix(':').ok_or_else(invalid)?;
        if port.is_empty() {
            return Err(invalid());
        }
        Ok((host, port))
    } else {
        let (host, port) = spec.rsplit_once(':').ok_or_else(invalid)?;
        if port.is_empty() {
            return Err(invalid());
        }
        Ok((host, port))
    }
}

/// Forward-resolve a hostname, preferring the first IPv4 result.
async fn lookup_first_ipv4(host: &str) -> Option<Ipv4Addr> {
    let addrs = tokio::net::lookup_host((host, 0u16)).await.ok()?;
    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ipv4_literal_passes_through() {
        let resolved = resolve("127.0.0.1:9000", false).await.unwrap();
        assert_eq!(resolved.as_str(), "127.0.0.1:9000");
    }

    #[tokio::test]
    async fn test_ipv6_literal_passes_through() {
        let resolved = resolve("[::1]:9000", true).await.unwrap();
        assert_eq!(resolved.as_str(), "[::1]:9000");
    }

    #[tokio::test]
    async fn test_unknown_hostname_falls_back_to_spec() {
        let resolved = resolve("no-such-host.invalid:80", false).await.unwrap();
        assert_eq!(resolved.as_str(), "no-such-host.invalid:80");
    }

    #[tokio::test]
    async fn test_localhost_keeps_port() {
        let resolved = resolve("localhost:8080", false).await.unwrap();
        assert!(resolved.as_str().ends_with(":8080"));
    }

    #[tokio::test]
    async fn test_empty_host_is_wildcard() {
        let resolved = resolve(":8080", true).await.unwrap();
        assert_eq!(resolved.as_str(), "0.0.0.0:8080");

        let resolved = resolve(":53", false).await.unwrap();
        assert_eq!(resolved.as_str(), "0.0.0.0:53");
    }

    #[tokio::test]
    async fn test_remote_without_port_is_invalid() {
        let result = resolve("nohost", false).await;
        assert!(matches!(result, Err(ResolveError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_unknown_interface() {
        let result = resolve("nonexistent0", true).await;
        assert!(matches!(
            result,
            Err(ResolveError::InterfaceNotFound { .. })
        ));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_loopback_interface_resolves_to_ephemeral_port() {
        let resolved = resolve("lo", true).await.unwrap();
        assert_eq!(resolved.as_str(), "127.0.0.1:0");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("a:1").unwrap(), ("a", "1"));
        assert_eq!(split_host_port("[::1]:1").unwrap(), ("::1", "1"));
        assert_eq!(split_host_port(":1").unwrap(), ("", "1"));
        assert!(split_host_port("a:").is_err());
        assert!(split_host_port("[::1]").is_err());
    }
}
