//! UDP forwarder: datagram relay with bounded in-flight forwards.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::error::{ForwardError, ForwardResult};
use super::ForwarderSpec;
use crate::net::ResolvedAddr;

/// Upper bound on concurrently in-flight datagram forwards.
pub const MAX_IN_FLIGHT: usize = 1000;

/// Receive buffer size per datagram; longer payloads are truncated by
/// the socket.
const DATAGRAM_BUFFER_SIZE: usize = 4096;

/// How long to wait for a single reply from the remote.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Statistics for a UDP forwarder.
#[derive(Debug, Clone, Default)]
pub struct UdpForwarderStats {
    /// Datagrams received on the listen socket.
    pub datagrams_received: u64,

    /// Datagrams successfully sent to the remote.
    pub datagrams_forwarded: u64,

    /// Replies relayed back to clients.
    pub replies_sent: u64,

    /// Forwards that failed or saw no reply in time.
    pub forward_errors: u64,

    /// Forwards currently in flight.
    pub in_flight: u64,

    /// High-water mark of concurrent forwards.
    pub max_in_flight: u64,
}

#[derive(Default)]
struct StatsInner {
    datagrams_received: AtomicU64,
    datagrams_forwarded: AtomicU64,
    replies_sent: AtomicU64,
    forward_errors: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl StatsInner {
    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.max_in_flight.fetch_max(now, Ordering::Relaxed);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// A UDP forwarder instance: one bound listen socket for one service.
///
/// Each inbound datagram gets a fresh outbound socket and a single
/// reply window; there is no session table. Clients sending from the
/// same source keep working because replies are addressed by the
/// recorded source of each datagram.
pub struct UdpForwarder {
    spec: ForwarderSpec,
    socket: Arc<UdpSocket>,
    limiter: Arc<Semaphore>,
    stats: Arc<StatsInner>,
}

impl UdpForwarder {
    /// Bind the resolved listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails; the caller logs it and this
    /// instance never starts, without affecting sibling forwarders.
    pub async fn bind(spec: ForwarderSpec) -> ForwardResult<Self> {
        let socket = UdpSocket::bind(spec.listen.as_str())
            .await
            .map_err(|e| ForwardError::Bind {
                address: spec.listen.to_string(),
                source: e,
            })?;

        Ok(Self {
            spec,
            socket: Arc::new(socket),
            limiter: Arc::new(Semaphore::new(MAX_IN_FLIGHT)),
            stats: Arc::new(StatsInner::default()),
        })
    }

    /// Override the in-flight forward cap.
    #[must_use]
    pub fn with_max_in_flight(mut self, cap: usize) -> Self {
        self.limiter = Arc::new(Semaphore::new(cap));
        self
    }

    /// The locally bound address (useful when listening on port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be determined.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Get forwarder statistics.
    #[must_use]
    pub fn stats(&self) -> UdpForwarderStats {
        UdpForwarderStats {
            datagrams_received: self.stats.datagrams_received.load(Ordering::Relaxed),
            datagrams_forwarded: self.stats.datagrams_forwarded.load(Ordering::Relaxed),
            replies_sent: self.stats.replies_sent.load(Ordering::Relaxed),
            forward_errors: self.stats.forward_errors.load(Ordering::Relaxed),
            in_flight: self.stats.in_flight.load(Ordering::Relaxed),
            max_in_flight: self.stats.max_in_flight.load(Ordering::Relaxed),
        }
    }

    /// Run the receive loop.
    ///
    /// Receive errors are logged and tolerated; each datagram is
    /// forwarded on its own task once a permit is available. Never
    /// returns under normal operation.
    pub async fn run(&self) {
        info!(
            service = self.spec.label(),
            listen = %self.spec.listen,
            remote = %self.spec.remote,
            "UDP forwarder started"
        );

        loop {
            let mut buffer = vec![0u8; DATAGRAM_BUFFER_SIZE];
            let (len, peer) = match self.socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    error!(service = self.spec.label(), error = %e, "receive error");
                    continue;
                },
            };
            buffer.truncate(len);
            self.stats.datagrams_received.fetch_add(1, Ordering::Relaxed);

            // Backpressure: block reading further datagrams until a
            // forward slot frees up.
            let Ok(permit) = Arc::clone(&self.limiter).acquire_owned().await else {
                return;
            };
            self.stats.enter();

            let spec = self.spec.clone();
            let listener = Arc::clone(&self.socket);
            let stats = Arc::clone(&self.stats);
            tokio::spawn(async move {
                match forward_datagram(listener, buffer, peer, spec.remote.clone()).await {
                    Ok(reply_len) => {
                        stats.datagrams_forwarded.fetch_add(1, Ordering::Relaxed);
                        stats.replies_sent.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            service = spec.label(),
                            peer = %peer,
                            reply_len,
                            "relayed datagram"
                        );
                    },
                    Err(ForwardError::ReplyTimeout) => {
                        stats.datagrams_forwarded.fetch_add(1, Ordering::Relaxed);
                        stats.forward_errors.fetch_add(1, Ordering::Relaxed);
                        debug!(service = spec.label(), peer = %peer, "no reply within window");
                    },
                    Err(e) => {
                        stats.forward_errors.fetch_add(1, Ordering::Relaxed);
                        error!(service = spec.label(), peer = %peer, error = %e, "forward error");
                    },
                }
                stats.exit();
                drop(permit);
            });
        }
    }
}

/// Forward one datagram over a fresh ephemeral socket and relay at
/// most one reply back to the original sender.
///
/// The outbound socket is bound to the unspecified address of the
/// remote's family so IPv6 remotes work.
async fn forward_datagram(
    listener: Arc<UdpSocket>,
    datagram: Vec<u8>,
    peer: SocketAddr,
    remote: ResolvedAddr,
) -> ForwardResult<usize> {
    let dial = |e: std::io::Error| ForwardError::Dial {
        address: remote.to_string(),
        source: e,
    };

    let remote_addr = tokio::net::lookup_host(remote.as_str())
        .await
        .map_err(dial)?
        .next()
        .ok_or_else(|| {
            dial(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no addresses found",
            ))
        })?;

    let local = if remote_addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
    let outbound = UdpSocket::bind(local).await?;
    outbound.connect(remote_addr).await.map_err(dial)?;
    outbound.send(&datagram).await?;

    let mut reply = vec![0u8; DATAGRAM_BUFFER_SIZE];
    let len = match timeout(REPLY_TIMEOUT, outbound.recv(&mut reply)).await {
        Ok(received) => received?,
        Err(_) => return Err(ForwardError::ReplyTimeout),
    };

    listener.send_to(&reply[..len], peer).await?;
    Ok(len)
}
