//! Network address resolution and transport selection.
//!
//! This module turns the opaque address and transport strings found in
//! service configuration into concrete, dialable values: [`resolver`]
//! maps listen/remote specs to `host:port` strings and [`transport`]
//! normalizes the loosely-shaped `type` field into a set of transports.

pub mod error;
pub mod resolver;
pub mod transport;

pub use error::{ResolveError, ResolveResult, TransportError, TransportResult};
pub use resolver::{resolve, ResolvedAddr};
pub use transport::{select_transports, Transport, TransportField};
