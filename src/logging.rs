//! Logging setup.
//!
//! The configured `loglevel` maps onto a tracing filter: `none` keeps
//! only errors, `debug` enables per-connection detail, and anything
//! else (including absent) means info. The `--debug` CLI flag and the
//! `RUST_LOG` environment variable both override the file value.

use tracing_subscriber::{fmt, EnvFilter};

/// Effective log verbosity for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only.
    None,
    /// Lifecycle events and errors.
    Info,
    /// Per-connection and per-datagram detail.
    Debug,
}

impl LogLevel {
    /// Determine the effective level from the config value and the
    /// CLI debug flag. The flag wins.
    #[must_use]
    pub fn from_config(loglevel: Option<&str>, debug_flag: bool) -> Self {
        if debug_flag {
            return Self::Debug;
        }
        match loglevel.map(str::to_ascii_lowercase).as_deref() {
            Some("none") => Self::None,
            Some("debug") => Self::Debug,
            _ => Self::Info,
        }
    }

    /// The tracing filter directive for this level.
    #[must_use]
    pub fn directive(self) -> &'static str {
        match self {
            Self::None => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the resolved level when set.
/// Calling this twice is harmless; the second call is ignored.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
