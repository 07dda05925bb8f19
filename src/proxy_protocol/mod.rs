//! PROXY protocol v1 (text form) header codec.
//!
//! The v1 header is a single plaintext line prefixed to a TCP byte
//! stream, conveying the original client/server endpoints across an
//! intermediary hop:
//!
//! ```text
//! PROXY <TCP4|TCP6> <srcIP> <dstIP> <srcPort> <dstPort>\r\n
//! ```
//!
//! Headers are parsed once per inbound connection and consumed
//! immediately; they are never persisted.

pub mod error;

use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub use error::{ProxyProtocolError, ProxyProtocolResult};

/// Protocol family carried in a v1 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFamily {
    /// IPv4 endpoints.
    Tcp4,

    /// IPv6 endpoints.
    Tcp6,
}

impl ProtocolFamily {
    /// Get the wire-format family token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp4 => "TCP4",
            Self::Tcp6 => "TCP6",
        }
    }
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded PROXY protocol v1 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHeader {
    /// Original source (client) endpoint.
    pub src: SocketAddr,

    /// Original destination endpoint.
    pub dst: SocketAddr,
}

impl ProxyHeader {
    /// Build a header from a source/destination endpoint pair.
    ///
    /// IPv4-mapped IPv6 addresses are normalized to IPv4 so the wire
    /// form matches what the peer actually spoke.
    #[must_use]
    pub fn from_addrs(src: SocketAddr, dst: SocketAddr) -> Self {
        Self {
            src: normalize(src),
            dst: normalize(dst),
        }
    }

    /// Protocol family, derived from the source address.
    ///
    /// `TCP6` iff the source IP has no IPv4 representation.
    #[must_use]
    pub fn family(&self) -> ProtocolFamily {
        match self.src.ip() {
            IpAddr::V4(_) => ProtocolFamily::Tcp4,
            IpAddr::V6(_) => ProtocolFamily::Tcp6,
        }
    }

    /// Decode a v1 header line.
    ///
    /// The line must tokenize into at least 6 space-separated fields
    /// with the first literally `PROXY`. Ports that fail to parse are
    /// tolerated as port 0 (deliberate leniency); address fields must
    /// parse as IPs.
    ///
    /// # Errors
    ///
    /// Returns an error for short or mis-prefixed lines and for
    /// unparseable address fields.
    pub fn decode(line: &str) -> ProxyProtocolResult<Self> {
        let fields: Vec<&str> = line.trim().split(' ').filter(|f| !f.is_empty()).collect();

        if fields.len() < 6 {
            return Err(ProxyProtocolError::Malformed {
                reason: format!("expected at least 6 fields, got {}", fields.len()),
            });
        }
        if fields[0] != "PROXY" {
            return Err(ProxyProtocolError::Malformed {
                reason: format!("expected PROXY prefix, got '{}'", fields[0]),
            });
        }

        let src_ip = parse_ip(fields[2])?;
        let dst_ip = parse_ip(fields[3])?;
        let src_port = fields[4].parse::<u16>().unwrap_or(0);
        let dst_port = fields[5].parse::<u16>().unwrap_or(0);

        Ok(Self::from_addrs(
            SocketAddr::new(src_ip, src_port),
            SocketAddr::new(dst_ip, dst_port),
        ))
    }

    /// Encode the header into its wire form, terminated by `\r\n`.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "PROXY {} {} {} {} {}\r\n",
            self.family(),
            self.src.ip(),
            self.dst.ip(),
            self.src.port(),
            self.dst.port(),
        )
    }
}

fn parse_ip(value: &str) -> ProxyProtocolResult<IpAddr> {
    value
        .parse::<IpAddr>()
        .map_err(|_| ProxyProtocolError::InvalidAddress {
            value: value.to_string(),
        })
}

fn normalize(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => SocketAddr::new(IpAddr::V4(v4), addr.port()),
            None => addr,
        },
        IpAddr::V4(_) => addr,
    }
}
