use crate::domain::error::{TcpLinkError, TcpLinkResult};
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often the accept and read loops look at the shutdown token.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bytes read from the client per chunk. Each reply is the prefix followed
/// by one chunk, so a reply may exceed a single client receive.
pub const ECHO_CHUNK_SIZE: usize = 1023;

/// Cancellation flag handed to [`EchoServer::serve`].
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    cancelled: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerStats {
    pub bind_addr: Option<SocketAddr>,
    pub connections_accepted: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// Blocking echo peer serving one connection at a time.
///
/// Every chunk read from the client is answered with `prefix ++ chunk`.
pub struct EchoServer {
    listener: TcpListener,
    bind_addr: SocketAddr,
    prefix: Vec<u8>,
}

impl EchoServer {
    pub fn bind(bind_addr: &str, prefix: impl Into<Vec<u8>>) -> TcpLinkResult<Self> {
        let listener = TcpListener::bind(bind_addr).map_err(|e| TcpLinkError::Server {
            message: format!("Failed to bind to {}: {}", bind_addr, e),
        })?;

        let actual_addr = listener.local_addr().map_err(|e| TcpLinkError::Server {
            message: format!("Failed to get local address: {}", e),
        })?;

        // Non-blocking accept lets the loop notice cancellation.
        listener.set_nonblocking(true)?;

        info!("Echo server created on {}", actual_addr);

        Ok(Self {
            listener,
            bind_addr: actual_addr,
            prefix: prefix.into(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Accept and serve connections until `token` is cancelled.
    pub fn serve(&self, token: &ShutdownToken) -> TcpLinkResult<ServerStats> {
        let mut stats = ServerStats {
            bind_addr: Some(self.bind_addr),
            ..ServerStats::default()
        };

        info!("Echo server listening on {}", self.bind_addr);

        while !token.is_cancelled() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    info!("Client connected: {}", addr);
                    stats.connections_accepted += 1;

                    if let Err(e) = self.handle_client(stream, addr, token, &mut stats) {
                        error!("Error handling client {}: {}", addr, e);
                    }
                    info!("Client disconnected: {}", addr);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }

        info!(
            "Echo server on {} stopped after {} connection(s)",
            self.bind_addr, stats.connections_accepted
        );
        Ok(stats)
    }

    /// Run [`EchoServer::serve`] on a dedicated thread.
    pub fn spawn(self, token: ShutdownToken) -> thread::JoinHandle<TcpLinkResult<ServerStats>> {
        thread::spawn(move || self.serve(&token))
    }

    fn handle_client(
        &self,
        mut stream: TcpStream,
        addr: SocketAddr,
        token: &ShutdownToken,
        stats: &mut ServerStats,
    ) -> TcpLinkResult<()> {
        // Accepted sockets may inherit the listener's non-blocking flag.
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;

        let mut buffer = [0u8; ECHO_CHUNK_SIZE];

        while !token.is_cancelled() {
            let n = match stream.read(&mut buffer) {
                Ok(0) => {
                    debug!("Client {} disconnected gracefully", addr);
                    break;
                }
                Ok(n) => n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Read error from {}: {}", addr, e);
                    break;
                }
            };

            stats.bytes_received += n as u64;
            debug!(
                "Received {} bytes from {}: {:?}",
                n,
                addr,
                String::from_utf8_lossy(&buffer[..n])
            );

            let mut response = Vec::with_capacity(self.prefix.len() + n);
            response.extend_from_slice(&self.prefix);
            response.extend_from_slice(&buffer[..n]);

            if let Err(e) = stream.write_all(&response) {
                warn!("Failed to write to stream for {}: {}", addr, e);
                break;
            }
            stats.bytes_sent += response.len() as u64;
            debug!("Sent response ({} bytes) to {}", response.len(), addr);
        }

        Ok(())
    }
}
