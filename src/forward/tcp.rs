//! TCP forwarder: accept loop and bidirectional relay.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info};

use super::error::{ForwardError, ForwardResult};
use super::ForwarderSpec;
use crate::proxy_protocol::{ProxyHeader, ProxyProtocolError};

/// Idle timeout for an established relay, refreshed by activity in
/// either direction.
pub const RELAY_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Copy buffer size per relay direction.
const RELAY_BUFFER_SIZE: usize = 16 * 1024;

/// Longest accepted PROXY header line, including the newline.
const MAX_HEADER_LINE: u64 = 256;

/// Statistics for a TCP forwarder.
#[derive(Debug, Clone, Default)]
pub struct TcpForwarderStats {
    /// Total connections accepted.
    pub total_accepted: u64,

    /// Connections currently being relayed.
    pub active_connections: u64,

    /// Accept failures (the loop keeps running).
    pub accept_errors: u64,

    /// Connections that ended with an error or timeout.
    pub relay_errors: u64,
}

/// Inner statistics (atomic counters).
#[derive(Default)]
struct StatsInner {
    total_accepted: AtomicU64,
    active_connections: AtomicU64,
    accept_errors: AtomicU64,
    relay_errors: AtomicU64,
}

/// A TCP forwarder instance: one bound listener for one service.
pub struct TcpForwarder {
    spec: ForwarderSpec,
    listener: TcpListener,
    idle_timeout: Duration,
    stats: Arc<StatsInner>,
}

impl TcpForwarder {
    /// Bind the resolved listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails; the caller logs it and this
    /// instance never starts, without affecting sibling forwarders.
    pub async fn bind(spec: ForwarderSpec) -> ForwardResult<Self> {
        let listener =
            TcpListener::bind(spec.listen.as_str())
                .await
                .map_err(|e| ForwardError::Bind {
                    address: spec.listen.to_string(),
                    source: e,
                })?;

        Ok(Self {
            spec,
            listener,
            idle_timeout: RELAY_IDLE_TIMEOUT,
            stats: Arc::new(StatsInner::default()),
        })
    }

    /// Override the relay idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// The locally bound address (useful when listening on port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be determined.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Get forwarder statistics.
    #[must_use]
    pub fn stats(&self) -> TcpForwarderStats {
        TcpForwarderStats {
            total_accepted: self.stats.total_accepted.load(Ordering::Relaxed),
            active_connections: self.stats.active_connections.load(Ordering::Relaxed),
            accept_errors: self.stats.accept_errors.load(Ordering::Relaxed),
            relay_errors: self.stats.relay_errors.load(Ordering::Relaxed),
        }
    }

    /// Run the accept loop.
    ///
    /// Accept errors are logged and tolerated; each accepted connection
    /// is relayed on its own task. Never returns under normal
    /// operation.
    pub async fn run(&self) {
        info!(
            service = self.spec.label(),
            listen = %self.spec.listen,
            remote = %self.spec.remote,
            send_proxy = self.spec.send_proxy,
            accept_proxy = self.spec.accept_proxy,
            "TCP forwarder started"
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    self.stats.total_accepted.fetch_add(1, Ordering::Relaxed);
                    self.stats.active_connections.fetch_add(1, Ordering::Relaxed);
                    debug!(service = self.spec.label(), peer = %peer, "accepted TCP connection");

                    let spec = self.spec.clone();
                    let idle = self.idle_timeout;
                    let stats = Arc::clone(&self.stats);
                    tokio::spawn(async move {
                        match handle_connection(stream, &spec, idle).await {
                            Ok(()) => {},
                            Err(ForwardError::RelayTimeout) => {
                                debug!(service = spec.label(), peer = %peer, "relay idle timeout");
                            },
                            Err(e) => {
                                stats.relay_errors.fetch_add(1, Ordering::Relaxed);
                                error!(service = spec.label(), peer = %peer, error = %e, "connection error");
                            },
                        }
                        stats.active_connections.fetch_sub(1, Ordering::Relaxed);
                    });
                },
                Err(e) => {
                    self.stats.accept_errors.fetch_add(1, Ordering::Relaxed);
                    error!(service = self.spec.label(), error = %e, "accept error");
                },
            }
        }
    }
}

/// Relay one accepted connection until either side closes, an error
/// occurs, or the idle timeout fires. The timeout bounds every read
/// and every write, so a peer that stops draining cannot park the
/// connection. Both sockets are dropped (and therefore closed) on
/// every exit path.
async fn handle_connection(
    stream: TcpStream,
    spec: &ForwarderSpec,
    idle: Duration,
) -> ForwardResult<()> {
    let peer = stream.peer_addr()?;
    let local = stream.local_addr()?;
    let (client_read, mut client_write) = stream.into_split();
    let mut client_read = BufReader::new(client_read);

    // The header line is consumed before anything else and is not
    // replayed into the relayed byte stream.
    let forwarded = if spec.accept_proxy {
        Some(read_proxy_header(&mut client_read).await?)
    } else {
        None
    };

    let remote = TcpStream::connect(spec.remote.as_str())
        .await
        .map_err(|e| ForwardError::Dial {
            address: spec.remote.to_string(),
            source: e,
        })?;
    let (mut remote_read, mut remote_write) = remote.into_split();

    if spec.send_proxy {
        let header = forwarded.unwrap_or_else(|| ProxyHeader::from_addrs(peer, local));
        remote_write.write_all(header.encode().as_bytes()).await?;
    }

    let mut inbound = vec![0u8; RELAY_BUFFER_SIZE];
    let mut outbound = vec![0u8; RELAY_BUFFER_SIZE];

    loop {
        tokio::select! {
            result = timeout(idle, client_read.read(&mut inbound)) => match result {
                Ok(Ok(0)) => return Ok(()),
                Ok(Ok(n)) => write_within(&mut remote_write, &inbound[..n], idle).await?,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ForwardError::RelayTimeout),
            },
            result = timeout(idle, remote_read.read(&mut outbound)) => match result {
                Ok(Ok(0)) => return Ok(()),
                Ok(Ok(n)) => write_within(&mut client_write, &outbound[..n], idle).await?,
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ForwardError::RelayTimeout),
            },
        }
    }
}

/// Write the whole buffer within the idle window.
async fn write_within<W>(writer: &mut W, buf: &[u8], idle: Duration) -> ForwardResult<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    match timeout(idle, writer.write_all(buf)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ForwardError::RelayTimeout),
    }
}

/// Read one `\n`-terminated PROXY header line from the inbound stream.
async fn read_proxy_header<R>(reader: &mut R) -> ForwardResult<ProxyHeader>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut limited = reader.take(MAX_HEADER_LINE);
    limited.read_line(&mut line).await?;

    if !line.ends_with('\n') {
        return Err(ProxyProtocolError::Malformed {
            reason: "header line not terminated".to_string(),
        }
        .into());
    }

    Ok(ProxyHeader::decode(&line)?)
}
