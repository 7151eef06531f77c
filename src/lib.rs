//! TcpLink Library
//!
//! Minimal blocking TCP client with explicit connection lifecycle and
//! last-error reporting, plus a single-connection echo server and a
//! scripted session driver for exercising it.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::session::{run_session, send_once, DriverOptions, SessionReport};
pub use crate::domain::config::{TcpLinkConfig, DEFAULT_ECHO_PREFIX};
pub use crate::domain::error::{ClientError, ClientResult, TcpLinkError, TcpLinkResult};
pub use crate::infrastructure::tcp::{
    EchoServer, ServerStats, ShutdownToken, TcpClient, RECEIVE_BUFFER_SIZE,
};
