use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments for TcpLink
#[derive(Parser, Debug)]
#[command(
    name = "tcplink",
    version = env!("CARGO_PKG_VERSION"),
    about = "Blocking TCP client with an echo test peer",
    long_about = "A minimal blocking TCP client for exercising byte-stream peers, bundled with a single-connection echo server for manual testing."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a peer and run a scripted message exchange
    Connect(ConnectArgs),
    /// Send one payload and print the reply
    Send(SendArgs),
    /// Run the echo test server until Ctrl+C
    EchoServer(EchoServerArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

/// Scripted session arguments
#[derive(ClapArgs, Debug)]
pub struct ConnectArgs {
    /// Peer IPv4 address
    pub host: Option<String>,
    /// Peer port
    pub port: Option<u16>,
    /// Message to send (repeatable); defaults to the configured messages
    #[arg(short, long = "message")]
    pub messages: Vec<String>,
    /// Pause between messages in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Maximum bytes accepted per reply
    #[arg(long)]
    pub max_length: Option<usize>,
}

/// One-shot send arguments
#[derive(ClapArgs, Debug)]
pub struct SendArgs {
    /// Data to send
    pub data: String,
    /// Peer IPv4 address
    #[arg(long)]
    pub host: Option<String>,
    /// Peer port
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Data format (text, hex, base64)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: DataFormat,
    /// Maximum bytes accepted in the reply
    #[arg(long)]
    pub max_length: Option<usize>,
}

/// Echo server arguments
#[derive(ClapArgs, Debug)]
pub struct EchoServerArgs {
    /// Bind address
    #[arg(short, long)]
    pub bind: Option<String>,
    /// Port number
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Prefix prepended to each echoed chunk
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Show configuration file locations
    Path,
    /// Create a project configuration file
    Init {
        /// Project directory (defaults to the current directory)
        path: Option<PathBuf>,
    },
}

/// Payload encodings accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq)]
pub enum DataFormat {
    /// Raw text
    Text,
    /// Hexadecimal bytes
    Hex,
    /// Base64 encoded bytes
    Base64,
}
