use crate::core::session::report::{Exchange, SessionReport};
use crate::domain::config::ClientConfig;
use crate::domain::error::ClientResult;
use crate::infrastructure::tcp::client::TcpClient;
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Parameters of one driver run
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub host: String,
    pub port: u16,
    pub max_receive: usize,
    pub message_delay: Duration,
}

impl From<&ClientConfig> for DriverOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            max_receive: config.max_receive,
            message_delay: Duration::from_millis(config.message_delay_ms),
        }
    }
}

impl DriverOptions {
    fn peer(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connect, then send each message and wait for one reply to it.
///
/// The run stops at the first failure, which is recorded in the report
/// rather than returned.
pub fn run_session<M: AsRef<[u8]>>(options: &DriverOptions, messages: &[M]) -> SessionReport {
    let mut report = SessionReport::new(options.peer());
    let mut client = TcpClient::new();

    info!("Attempting to connect to {}", report.peer);
    if client.connect(&options.host, options.port).is_err() {
        report.error = Some(client.last_error().to_string());
        return report;
    }
    report.connected = true;

    for (i, message) in messages.iter().enumerate() {
        let message = message.as_ref();

        match exchange(&mut client, message, options.max_receive) {
            Ok(received) => {
                debug!("Exchange {} completed ({} bytes back)", i + 1, received.len());
                report.exchanges.push(Exchange {
                    timestamp: SystemTime::now(),
                    sent: message.to_vec(),
                    received,
                });
            }
            Err(_) => {
                warn!("Exchange {} failed: {}", i + 1, client.last_error());
                report.error = Some(client.last_error().to_string());
                break;
            }
        }

        if i + 1 < messages.len() && !options.message_delay.is_zero() {
            thread::sleep(options.message_delay);
        }
    }

    client.disconnect();
    info!("Disconnected from {}", report.peer);
    report
}

/// Single send followed by a single receive on a fresh connection.
pub fn send_once(options: &DriverOptions, payload: &[u8]) -> SessionReport {
    run_session(
        &DriverOptions {
            message_delay: Duration::ZERO,
            ..options.clone()
        },
        &[payload],
    )
}

fn exchange(client: &mut TcpClient, message: &[u8], max_receive: usize) -> ClientResult<Vec<u8>> {
    client.send(message)?;
    client.receive(max_receive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::tcp::server::{EchoServer, ShutdownToken};
    use std::io::Read;
    use std::net::TcpListener;

    fn options(port: u16) -> DriverOptions {
        DriverOptions {
            host: "127.0.0.1".to_string(),
            port,
            max_receive: 1024,
            message_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_session_against_echo_server() {
        let server = EchoServer::bind("127.0.0.1:0", "Server Echo: ").unwrap();
        let port = server.local_addr().port();
        let token = ShutdownToken::new();
        let handle = server.spawn(token.clone());

        let report = run_session(&options(port), &["Hello Server!", "Test Message 1"]);

        token.cancel();
        handle.join().unwrap().unwrap();

        assert!(report.is_success(), "{:?}", report.error);
        assert_eq!(report.exchanges.len(), 2);
        assert_eq!(report.exchanges[0].received_text(), "Server Echo: Hello Server!");
        assert_eq!(report.exchanges[1].received_text(), "Server Echo: Test Message 1");
    }

    #[test]
    fn test_session_connect_failure_is_reported() {
        let report = run_session(&options(1), &["never sent"]);
        assert!(!report.connected);
        assert!(report.exchanges.is_empty());
        assert!(report.error.is_some());
    }

    #[test]
    fn test_session_stops_when_peer_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let peer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let _ = stream.read(&mut buf);
            // Close without replying.
        });

        let report = send_once(&options(port), b"hello");
        peer.join().unwrap();

        assert!(report.connected);
        assert!(report.exchanges.is_empty());
        assert_eq!(report.error.as_deref(), Some("Connection closed by peer"));
    }
}
