use serde::{Deserialize, Serialize};

/// Prefix the echo server prepends to every reply unless configured otherwise
pub const DEFAULT_ECHO_PREFIX: &str = "Server Echo: ";

/// TcpLink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcpLinkConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Client driver defaults
    #[serde(default)]
    pub client: ClientConfig,
    /// Echo server defaults
    #[serde(default)]
    pub server: ServerConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Defaults for the `connect` and `send` commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Literal IPv4 address of the peer
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound passed to each receive
    #[serde(default = "default_max_receive")]
    pub max_receive: usize,
    /// Pause between messages of a session
    #[serde(default = "default_message_delay")]
    pub message_delay_ms: u64,
    /// Messages sent by `connect` when none are given
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,
}

/// Defaults for the `echo-server` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prepended to every echoed chunk
    #[serde(default = "default_echo_prefix")]
    pub echo_prefix: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    12345
}

fn default_max_receive() -> usize {
    1024
}

fn default_message_delay() -> u64 {
    500
}

fn default_messages() -> Vec<String> {
    ["Hello Server!", "Test Message 1", "Test Message 2", "QUIT"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_echo_prefix() -> String {
    DEFAULT_ECHO_PREFIX.to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_receive: default_max_receive(),
            message_delay_ms: default_message_delay(),
            messages: default_messages(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            echo_prefix: default_echo_prefix(),
        }
    }
}

impl ServerConfig {
    /// `bind:port` string accepted by `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
