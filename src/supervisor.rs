//! Service supervisor: turns resolved service descriptors into running
//! forwarder tasks.
//!
//! Every per-service failure (bad transport value, unresolvable
//! address, bind conflict, unsupported flag combination) is logged and
//! skipped; the remaining services keep starting. A configuration
//! where nothing can start leaves the process running with zero
//! listeners, which is deliberate.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ServiceDescriptor;
use crate::forward::{ForwarderSpec, TcpForwarder, UdpForwarder};
use crate::net::{resolve, select_transports, Transport};

/// Supervises one forwarder task per service and transport.
#[derive(Default)]
pub struct ServiceSupervisor {
    handles: Vec<JoinHandle<()>>,
}

impl ServiceSupervisor {
    /// Create an empty supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of forwarder tasks started so far.
    #[must_use]
    pub fn started(&self) -> usize {
        self.handles.len()
    }

    /// Start every service in the list, isolating failures.
    pub async fn start_all(&mut self, services: &[ServiceDescriptor]) {
        for service in services {
            self.start_service(service).await;
        }

        info!(forwarders = self.handles.len(), "supervisor startup complete");
    }

    /// Start one service: select transports, resolve addresses, and
    /// spawn one forwarder per transport.
    pub async fn start_service(&mut self, service: &ServiceDescriptor) {
        let transports = match select_transports(service.transport.as_ref()) {
            Ok(transports) => transports,
            Err(e) => {
                error!(service = service.label(), error = %e, "invalid transport selection");
                return;
            },
        };

        let listen = match resolve(&service.listen, true).await {
            Ok(addr) => addr,
            Err(e) => {
                error!(
                    service = service.label(),
                    listen = %service.listen,
                    error = %e,
                    "failed to resolve listen address"
                );
                return;
            },
        };

        let remote = match resolve(&service.remote, false).await {
            Ok(addr) => addr,
            Err(e) => {
                error!(
                    service = service.label(),
                    remote = %service.remote,
                    error = %e,
                    "failed to resolve remote address"
                );
                return;
            },
        };

        for transport in transports {
            let spec = ForwarderSpec {
                name: service.name.clone(),
                listen: listen.clone(),
                remote: remote.clone(),
                send_proxy: service.send_proxy,
                accept_proxy: service.accept_proxy,
            };

            // PROXY protocol v1 is a stream header; it has no meaning
            // for datagrams.
            if transport == Transport::Udp && (spec.send_proxy || spec.accept_proxy) {
                error!(
                    service = spec.label(),
                    "PROXY protocol flags are not supported over UDP"
                );
                continue;
            }

            let handle = match transport {
                Transport::Tcp => tokio::spawn(async move {
                    match TcpForwarder::bind(spec.clone()).await {
                        Ok(forwarder) => forwarder.run().await,
                        Err(e) => {
                            error!(service = spec.label(), error = %e, "TCP forwarder failed to start");
                        },
                    }
                }),
                Transport::Udp => tokio::spawn(async move {
                    match UdpForwarder::bind(spec.clone()).await {
                        Ok(forwarder) => forwarder.run().await,
                        Err(e) => {
                            error!(service = spec.label(), error = %e, "UDP forwarder failed to start");
                        },
                    }
                }),
            };
            self.handles.push(handle);
        }
    }

    /// Park until every forwarder task exits. Forwarders run forever,
    /// so in practice this never returns.
    pub async fn wait(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::TransportField;

    fn descriptor(listen: &str, remote: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            name: Some("test".to_string()),
            listen: listen.to_string(),
            remote: remote.to_string(),
            transport: None,
            send_proxy: false,
            accept_proxy: false,
        }
    }

    #[tokio::test]
    async fn test_starts_one_tcp_forwarder_by_default() {
        let mut supervisor = ServiceSupervisor::new();
        supervisor
            .start_service(&descriptor("127.0.0.1:0", "127.0.0.1:1"))
            .await;
        assert_eq!(supervisor.started(), 1);
    }

    #[tokio::test]
    async fn test_both_starts_two_forwarders() {
        let mut desc = descriptor("127.0.0.1:0", "127.0.0.1:1");
        desc.transport = Some(TransportField::Single("both".to_string()));

        let mut supervisor = ServiceSupervisor::new();
        supervisor.start_service(&desc).await;
        assert_eq!(supervisor.started(), 2);
    }

    #[tokio::test]
    async fn test_invalid_transport_skips_service() {
        let mut desc = descriptor("127.0.0.1:0", "127.0.0.1:1");
        desc.transport = Some(TransportField::Single("sctp".to_string()));

        let mut supervisor = ServiceSupervisor::new();
        supervisor.start_service(&desc).await;
        assert_eq!(supervisor.started(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_listen_skips_service() {
        let mut supervisor = ServiceSupervisor::new();
        supervisor
            .start_service(&descriptor("no-such-interface-zz0", "127.0.0.1:1"))
            .await;
        assert_eq!(supervisor.started(), 0);
    }

    #[tokio::test]
    async fn test_udp_with_proxy_flags_is_rejected() {
        let mut desc = descriptor("127.0.0.1:0", "127.0.0.1:1");
        desc.transport = Some(TransportField::Single("both".to_string()));
        desc.send_proxy = true;

        let mut supervisor = ServiceSupervisor::new();
        supervisor.start_service(&desc).await;
        // TCP still starts; the UDP half is skipped.
        assert_eq!(supervisor.started(), 1);
    }

    #[tokio::test]
    async fn test_one_bad_service_does_not_stop_others() {
        let services = vec![
            {
                let mut bad = descriptor("127.0.0.1:0", "127.0.0.1:1");
                bad.transport = Some(TransportField::Single("ipx".to_string()));
                bad
            },
            descriptor("127.0.0.1:0", "127.0.0.1:1"),
        ];

        let mut supervisor = ServiceSupervisor::new();
        supervisor.start_all(&services).await;
        assert_eq!(supervisor.started(), 1);
    }
}
