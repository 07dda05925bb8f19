//! PROXY protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding a PROXY protocol v1 header.
#[derive(Debug, Error)]
pub enum ProxyProtocolError {
    /// The header line is too short or does not start with `PROXY`.
    #[error("malformed PROXY header: {reason}")]
    Malformed {
        /// What was wrong with the line.
        reason: String,
    },

    /// An address field did not parse as an IP address.
    #[error("invalid address in PROXY header: '{value}'")]
    InvalidAddress {
        /// The offending address token.
        value: String,
    },
}

/// Result type for PROXY protocol operations.
pub type ProxyProtocolResult<T> = Result<T, ProxyProtocolError>;
