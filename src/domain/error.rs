use std::io;
use std::net::SocketAddrV4;
use thiserror::Error;

/// Failures reported by the TCP client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to create socket: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to connect: {source}")]
    Connect {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    #[error("Not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    Send(#[source] io::Error),

    #[error("Receive interrupted")]
    ReceiveInterrupted,

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Receive failed: {0}")]
    Receive(#[source] io::Error),
}

impl ClientError {
    /// Whether this failure released the connection handle.
    pub fn forces_disconnect(&self) -> bool {
        matches!(self, ClientError::ConnectionClosed)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// TcpLink unified error type
#[derive(Error, Debug)]
pub enum TcpLinkError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Server error: {message}")]
    Server { message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

pub type TcpLinkResult<T> = Result<T, TcpLinkError>;
