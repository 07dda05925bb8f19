//! Error types for address resolution and transport selection.

use thiserror::Error;

/// Errors that can occur while resolving an address spec.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The spec is not a valid `host:port` pair.
    #[error("invalid address '{spec}': expected host:port")]
    InvalidAddress {
        /// The offending address spec.
        spec: String,
    },

    /// A listen-side interface name did not match any local interface.
    #[error("network interface '{name}' not found")]
    InterfaceNotFound {
        /// The interface name that was looked up.
        name: String,
    },

    /// The named interface exists but carries no IPv4 address.
    #[error("no IPv4 address found on interface '{name}'")]
    NoIpv4Address {
        /// The interface name.
        name: String,
    },

    /// Enumerating local network interfaces failed.
    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(#[source] std::io::Error),
}

/// Result type for address resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors that can occur while selecting transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A transport string was neither `tcp`, `udp`, `both`, nor a
    /// bracketed list of those.
    #[error("invalid network type: {value}")]
    InvalidTransport {
        /// The offending transport value.
        value: String,
    },

    /// A transport sequence contained a non-string element.
    #[error("network type array contains non-string element ({shape})")]
    NonStringElement {
        /// The JSON shape of the offending element.
        shape: String,
    },

    /// The transport field had a shape other than string or sequence.
    #[error("unsupported network type shape: {shape}")]
    UnsupportedType {
        /// The JSON shape of the field.
        shape: String,
    },
}

/// Result type for transport selection.
pub type TransportResult<T> = Result<T, TransportError>;
