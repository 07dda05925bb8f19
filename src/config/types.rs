//! Configuration types and the service inheritance pass.

use serde::{Deserialize, Serialize};

use crate::net::TransportField;

/// Transport and PROXY protocol settings for one scope.
///
/// The proxy flags are tri-state: unset inherits the enclosing global
/// value at load time and finally defaults to `false`. By the time a
/// forwarder starts, both are plain booleans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSection {
    /// Raw transport selection: string, sequence, or absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportField>,

    /// Send a PROXY protocol v1 header to the remote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_proxy: Option<bool>,

    /// Expect a PROXY protocol v1 header from inbound clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_proxy: Option<bool>,
}

/// Global defaults applied to services with unset fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSection {
    /// Log level: `none`, `debug`, or anything else for info.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loglevel: Option<String>,

    /// Default network settings inherited by services.
    #[serde(default)]
    pub network: NetworkSection,
}

/// One configured forwarding service as it appears on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSection {
    /// Optional name, used only for log attribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Listen address spec (host:port or bare interface name).
    pub listen: String,

    /// Remote address spec (host:port).
    pub remote: String,

    /// Per-service network settings; unset fields inherit the global.
    #[serde(default)]
    pub network: NetworkSection,
}

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global defaults.
    #[serde(default)]
    pub global: GlobalSection,

    /// Configured services, in file order.
    #[serde(default)]
    pub services: Vec<ServiceSection>,
}

impl Config {
    /// Run the one-time inheritance pass over all services.
    ///
    /// Service values win; absent values inherit the global section;
    /// absent both defaults to tcp transport and disabled proxy flags.
    /// The returned descriptors are immutable from here on.
    #[must_use]
    pub fn resolved_services(&self) -> Vec<ServiceDescriptor> {
        self.services
            .iter()
            .map(|svc| ServiceDescriptor::resolve(svc, &self.global.network))
            .collect()
    }
}

/// Identity and policy for one forwarding rule.
///
/// Constructed once from configuration with every inheritable field
/// fully resolved, then handed to one forwarder task per transport.
/// No inheritance lookup happens after this point.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Optional name for log attribution; uniqueness is not enforced.
    pub name: Option<String>,

    /// Listen address spec, resolved lazily at service start.
    pub listen: String,

    /// Remote address spec, resolved lazily at service start.
    pub remote: String,

    /// Raw transport field, normalized at service start.
    pub transport: Option<TransportField>,

    /// Send a PROXY header to the remote (fully resolved).
    pub send_proxy: bool,

    /// Expect a PROXY header from inbound clients (fully resolved).
    pub accept_proxy: bool,
}

impl ServiceDescriptor {
    /// Resolve one service section against the global defaults.
    #[must_use]
    pub fn resolve(svc: &ServiceSection, global: &NetworkSection) -> Self {
        Self {
            name: svc.name.clone(),
            listen: svc.listen.clone(),
            remote: svc.remote.clone(),
            transport: svc
                .network
                .transport
                .clone()
                .or_else(|| global.transport.clone()),
            send_proxy: svc.network.send_proxy.or(global.send_proxy).unwrap_or(false),
            accept_proxy: svc
                .network
                .accept_proxy
                .or(global.accept_proxy)
                .unwrap_or(false),
        }
    }

    /// Label used for log attribution.
    #[must_use]
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "unnamed",
        }
    }
}
