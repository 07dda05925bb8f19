//! Forwarder error types.

use thiserror::Error;

use crate::proxy_protocol::ProxyProtocolError;

/// Errors that can occur in a forwarder instance.
///
/// All of these are isolated to one forwarder, one connection, or one
/// datagram; nothing propagates past the task that logs it.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Failed to bind the listen address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The address that failed to bind.
        address: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to reach the remote endpoint.
    #[error("failed to connect to remote {address}: {source}")]
    Dial {
        /// The remote address.
        address: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The inbound PROXY header was missing or malformed.
    #[error(transparent)]
    Proxy(#[from] ProxyProtocolError),

    /// The TCP relay saw no traffic within the idle window.
    #[error("relay idle timeout")]
    RelayTimeout,

    /// No UDP reply arrived within the reply window.
    #[error("no reply from remote within the reply window")]
    ReplyTimeout,

    /// IO error during relay.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for forwarder operations.
pub type ForwardResult<T> = Result<T, ForwardError>;
