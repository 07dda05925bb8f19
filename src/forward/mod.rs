//! Forwarder instances: one running listener per service and transport.
//!
//! A [`TcpForwarder`](tcp::TcpForwarder) accepts connections and relays
//! bytes bidirectionally, optionally consuming or producing a PROXY
//! protocol v1 header. A [`UdpForwarder`](udp::UdpForwarder) relays one
//! datagram at a time over a fresh outbound socket with a bounded
//! number of in-flight forwards.

pub mod error;
pub mod tcp;
pub mod udp;

pub use error::{ForwardError, ForwardResult};
pub use tcp::TcpForwarder;
pub use udp::UdpForwarder;

use crate::net::ResolvedAddr;

/// Fully-resolved parameters for one forwarder instance.
///
/// Produced by the supervisor after address resolution and the
/// inheritance pass; immutable for the forwarder's lifetime.
#[derive(Debug, Clone)]
pub struct ForwarderSpec {
    /// Service name for log attribution.
    pub name: Option<String>,

    /// Resolved listen address.
    pub listen: ResolvedAddr,

    /// Resolved remote address.
    pub remote: ResolvedAddr,

    /// Send a PROXY header to the remote before any payload.
    pub send_proxy: bool,

    /// Consume a PROXY header from inbound connections first.
    pub accept_proxy: bool,
}

impl ForwarderSpec {
    /// Label used for log attribution.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "unnamed",
        }
    }
}
