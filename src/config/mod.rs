//! Service configuration: file shapes, inheritance, and loading.
//!
//! Configuration arrives either from a YAML/JSON file or from
//! command-line flags. Both paths produce the same thing: a list of
//! immutable [`ServiceDescriptor`]s with every inheritable field fully
//! resolved before any forwarder starts.

pub mod error;
pub mod loader;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::{from_json_str, from_yaml_str, load};
pub use types::{Config, GlobalSection, NetworkSection, ServiceDescriptor, ServiceSection};
