//! pfw: a configurable TCP/UDP port forwarder with PROXY protocol v1
//! support.
//!
//! Services are declared in a YAML or JSON file (or a single one via
//! command-line flags), resolved once at startup, and run as
//! independent forwarder tasks. A failure in any one service,
//! connection, or datagram never takes down the rest.

pub mod cli;
pub mod config;
pub mod forward;
pub mod logging;
pub mod net;
pub mod proxy_protocol;
pub mod supervisor;
