use crate::domain::error::{ClientError, ClientResult};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use tracing::{debug, info, warn};

/// Upper bound on the bytes a single `receive` call can return.
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

/// Blocking client owning at most one outbound IPv4 stream.
///
/// Every failing operation returns the error and also records its
/// description, retrievable through [`TcpClient::last_error`]. The stream is
/// released on disconnect, on a peer-initiated close and on drop.
///
/// The type is deliberately not `Clone`. Use [`TcpClient::take`] to hand a
/// live connection over to another owner.
#[derive(Debug, Default)]
pub struct TcpClient {
    stream: Option<TcpStream>,
    last_error: String,
}

impl TcpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to a literal IPv4 `host` on `port`.
    ///
    /// An existing connection is closed first. No name resolution is
    /// performed, so `"localhost"` is rejected as an invalid address.
    pub fn connect(&mut self, host: &str, port: u16) -> ClientResult<()> {
        if self.is_connected() {
            self.disconnect();
        }

        let ip: Ipv4Addr = match host.parse() {
            Ok(ip) => ip,
            Err(_) => return self.fail(ClientError::InvalidAddress(host.to_string())),
        };
        let addr = SocketAddrV4::new(ip, port);

        match TcpStream::connect(addr) {
            Ok(stream) => {
                info!("TCP connection established to {}", addr);
                self.stream = Some(stream);
                self.last_error.clear();
                Ok(())
            }
            Err(e) if is_resource_exhausted(&e) => self.fail(ClientError::SocketCreate(e)),
            Err(e) => self.fail(ClientError::Connect { addr, source: e }),
        }
    }

    /// Close the connection if there is one. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if self.release() {
            self.last_error.clear();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Write all of `data`, retrying writes interrupted by a signal.
    ///
    /// A failed send leaves the connection open.
    pub fn send(&mut self, data: &[u8]) -> ClientResult<()> {
        let Some(stream) = self.stream.as_mut() else {
            return self.fail(ClientError::NotConnected);
        };

        match write_fully(stream, data) {
            Ok(()) => {
                debug!("Sent {} bytes over TCP", data.len());
                Ok(())
            }
            Err(e) => self.fail(ClientError::Send(e)),
        }
    }

    /// Perform one blocking read of at most
    /// `min(RECEIVE_BUFFER_SIZE, max_length)` bytes.
    ///
    /// A signal interrupting the read is reported as a failure rather than
    /// retried. A zero-byte read means the peer closed its side, which
    /// releases the connection.
    pub fn receive(&mut self, max_length: usize) -> ClientResult<Vec<u8>> {
        let Some(stream) = self.stream.as_mut() else {
            return self.fail(ClientError::NotConnected);
        };

        // A zero-length read would be indistinguishable from a peer close.
        if max_length == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
        let len = RECEIVE_BUFFER_SIZE.min(max_length);

        match classify_read(stream.read(&mut buffer[..len])) {
            ReadOutcome::Data(n) => {
                debug!("Received {} bytes over TCP", n);
                Ok(buffer[..n].to_vec())
            }
            ReadOutcome::PeerClosed => {
                info!("TCP connection closed by peer");
                self.release();
                self.fail(ClientError::ConnectionClosed)
            }
            ReadOutcome::Failed(err) => self.fail(err),
        }
    }

    /// Description of the most recent failure, empty if none is recorded.
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Move the connection and error state out, leaving `self` disconnected.
    pub fn take(&mut self) -> TcpClient {
        std::mem::take(self)
    }

    /// Drop the stream, returning whether one was held.
    fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(stream) => {
                if let Ok(peer) = stream.peer_addr() {
                    info!("Closing TCP connection to {}", peer);
                }
                drop(stream);
                true
            }
            None => false,
        }
    }

    fn fail<T>(&mut self, err: ClientError) -> ClientResult<T> {
        warn!("{}", err);
        self.last_error = err.to_string();
        Err(err)
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        self.release();
    }
}

#[derive(Debug)]
enum ReadOutcome {
    Data(usize),
    PeerClosed,
    Failed(ClientError),
}

fn classify_read(result: io::Result<usize>) -> ReadOutcome {
    match result {
        Ok(0) => ReadOutcome::PeerClosed,
        Ok(n) => ReadOutcome::Data(n),
        Err(e) if e.kind() == ErrorKind::Interrupted => {
            ReadOutcome::Failed(ClientError::ReceiveInterrupted)
        }
        Err(e) => ReadOutcome::Failed(ClientError::Receive(e)),
    }
}

/// Keep writing until `data` is exhausted. Short writes and `Interrupted`
/// are absorbed; a writer accepting zero bytes is a hard failure.
fn write_fully<W: Write>(writer: &mut W, data: &[u8]) -> io::Result<()> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    "transport accepted zero bytes",
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

// EMFILE / ENFILE: the descriptor table is full, so no socket was allocated.
#[cfg(unix)]
fn is_resource_exhausted(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(23) | Some(24))
}

#[cfg(not(unix))]
fn is_resource_exhausted(err: &io::Error) -> bool {
    err.kind() == ErrorKind::OutOfMemory
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::net::TcpListener;

    /// Writer that accepts at most `chunk` bytes per call and fails every
    /// `interrupt_every`-th call with `Interrupted`.
    struct ChoppyWriter {
        chunk: usize,
        interrupt_every: usize,
        calls: usize,
        sink: Vec<u8>,
    }

    impl Write for ChoppyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.interrupt_every > 0 && self.calls % self.interrupt_every == 0 {
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.chunk);
            self.sink.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter(ErrorKind);

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    proptest! {
        #[test]
        fn test_write_fully_delivers_every_byte(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk in 1usize..64,
            interrupt_every in prop::sample::select(vec![0usize, 2, 3, 5]),
        ) {
            let mut writer = ChoppyWriter { chunk, interrupt_every, calls: 0, sink: Vec::new() };
            prop_assert!(write_fully(&mut writer, &data).is_ok());
            prop_assert_eq!(writer.sink, data);
        }
    }

    #[test]
    fn test_write_fully_aborts_on_hard_error() {
        let mut writer = FailingWriter(ErrorKind::BrokenPipe);
        let err = write_fully(&mut writer, b"payload").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_write_fully_rejects_zero_progress() {
        let mut writer = ChoppyWriter { chunk: 0, interrupt_every: 0, calls: 0, sink: Vec::new() };
        let err = write_fully(&mut writer, b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
    }

    #[test]
    fn test_classify_read() {
        assert!(matches!(classify_read(Ok(5)), ReadOutcome::Data(5)));
        assert!(matches!(classify_read(Ok(0)), ReadOutcome::PeerClosed));
        assert!(matches!(
            classify_read(Err(io::Error::from(ErrorKind::Interrupted))),
            ReadOutcome::Failed(ClientError::ReceiveInterrupted)
        ));
        assert!(matches!(
            classify_read(Err(io::Error::from(ErrorKind::ConnectionReset))),
            ReadOutcome::Failed(ClientError::Receive(_))
        ));
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = TcpClient::new();
        assert!(!client.is_connected());
        assert!(client.last_error().is_empty());
        assert!(client.peer_addr().is_none());
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut client = TcpClient::new();
        let err = client.connect("not.an.ip", 12345).unwrap_err();
        assert!(matches!(err, ClientError::InvalidAddress(_)));
        assert!(!client.is_connected());
        assert_eq!(client.last_error(), "Invalid address: not.an.ip");
    }

    #[test]
    fn test_hostnames_and_ipv6_rejected() {
        let mut client = TcpClient::new();
        assert!(matches!(
            client.connect("localhost", 80),
            Err(ClientError::InvalidAddress(_))
        ));
        assert!(matches!(
            client.connect("::1", 80),
            Err(ClientError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_send_and_receive_require_connection() {
        let mut client = TcpClient::new();

        assert!(matches!(client.send(b"ping"), Err(ClientError::NotConnected)));
        assert_eq!(client.last_error(), "Not connected");

        assert!(matches!(client.receive(1024), Err(ClientError::NotConnected)));
        assert_eq!(client.last_error(), "Not connected");
    }

    #[test]
    fn test_disconnect_when_disconnected_is_noop() {
        let mut client = TcpClient::new();
        let _ = client.send(b"x");
        client.disconnect();
        assert!(!client.is_connected());
        // No live connection was closed, so the recorded error survives.
        assert_eq!(client.last_error(), "Not connected");
    }

    #[test]
    fn test_connect_to_closed_port_fails() {
        // Bind then drop to find a port nobody is listening on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut client = TcpClient::new();
        let err = client.connect("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
        assert!(!client.is_connected());
        assert!(client.last_error().starts_with("Failed to connect"));
    }

    #[test]
    fn test_receive_zero_length_does_not_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut client = TcpClient::new();
        client.connect("127.0.0.1", port).unwrap();
        let (_peer, _) = listener.accept().unwrap();

        assert!(client.receive(0).unwrap().is_empty());
        assert!(client.is_connected());
    }

    #[test]
    fn test_successful_connect_clears_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut client = TcpClient::new();
        let _ = client.connect("bogus", port);
        assert!(!client.last_error().is_empty());

        client.connect("127.0.0.1", port).unwrap();
        assert!(client.is_connected());
        assert!(client.last_error().is_empty());
        assert_eq!(client.peer_addr().map(|a| a.port()), Some(port));
    }

    #[test]
    fn test_forces_disconnect() {
        assert!(ClientError::ConnectionClosed.forces_disconnect());
        assert!(!ClientError::ReceiveInterrupted.forces_disconnect());
        assert!(!ClientError::NotConnected.forces_disconnect());
    }
}
