use crate::cli::args::OutputFormat;
use crate::core::session::SessionReport;
use crate::domain::config::TcpLinkConfig;
use crate::infrastructure::tcp::server::ServerStats;
use std::io::{self, Write};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_report(&self, report: &SessionReport) -> Result<(), OutputError>;
    fn write_server_stats(&self, stats: &ServerStats) -> Result<(), OutputError>;
    fn write_config(&self, config: &TcpLinkConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::TcpLinkError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a session report in text form
    pub fn format_report(report: &SessionReport) -> String {
        let mut out = String::new();
        if report.connected {
            out.push_str(&format!("Connected to {}\n", report.peer));
        }
        for exchange in &report.exchanges {
            out.push_str(&format!("Sent: {}\n", exchange.sent_text()));
            out.push_str(&format!("Received: {}\n", exchange.received_text()));
        }
        match &report.error {
            Some(error) if report.connected => out.push_str(&format!("Failed: {}\n", error)),
            Some(error) => out.push_str(&format!("Connection failed: {}\n", error)),
            None => out.push_str(&format!(
                "{} exchange(s), {} bytes sent, {} bytes received\n",
                report.exchanges.len(),
                report.bytes_sent(),
                report.bytes_received()
            )),
        }
        out
    }

    fn print_json<T: serde::Serialize>(value: &T) -> Result<(), OutputError> {
        let output = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{}", output)?;
        Ok(())
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_report(&self, report: &SessionReport) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => write!(io::stdout(), "{}", Self::format_report(report))?,
            OutputFormat::Json => Self::print_json(report)?,
        }
        Ok(())
    }

    fn write_server_stats(&self, stats: &ServerStats) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                let mut stdout = io::stdout();
                writeln!(stdout, "Server Statistics:")?;
                if let Some(addr) = stats.bind_addr {
                    writeln!(stdout, "  Address: {}", addr)?;
                }
                writeln!(stdout, "  Connections: {}", stats.connections_accepted)?;
                writeln!(stdout, "  Bytes received: {}", stats.bytes_received)?;
                writeln!(stdout, "  Bytes sent: {}", stats.bytes_sent)?;
            }
            OutputFormat::Json => Self::print_json(stats)?,
        }
        Ok(())
    }

    fn write_config(&self, config: &TcpLinkConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                let output = toml::to_string_pretty(config)?;
                write!(io::stdout(), "{}", output)?;
            }
            OutputFormat::Json => Self::print_json(config)?,
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => writeln!(io::stdout(), "{}", message)?,
            OutputFormat::Json => Self::print_json(&serde_json::json!({ "message": message }))?,
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => writeln!(io::stderr(), "Error: {}", error)?,
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(&serde_json::json!({ "error": error }))?;
                writeln!(io::stderr(), "{}", output)?;
            }
        }
        Ok(())
    }
}
