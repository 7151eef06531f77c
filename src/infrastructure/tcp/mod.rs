// TCP module - blocking client and echo test peer
pub mod client;
pub mod server;

pub use client::{TcpClient, RECEIVE_BUFFER_SIZE};
pub use server::{EchoServer, ServerStats, ShutdownToken};
