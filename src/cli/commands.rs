use crate::cli::args::{
    Args, Command, ConfigCommand, ConnectArgs, DataFormat, EchoServerArgs, OutputFormat, SendArgs,
};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::session::{run_session, send_once, DriverOptions, SessionReport};
use crate::domain::config::TcpLinkConfig;
use crate::domain::error::{TcpLinkError, TcpLinkResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::tcp::server::{EchoServer, ShutdownToken};
use std::time::Duration;
use tracing::info;

/// Execute CLI command
pub async fn execute_command(args: Args) -> TcpLinkResult<()> {
    let writer = ConsoleWriter::new(args.output);

    let config_manager = ConfigManager::new();
    let config = match &args.config {
        Some(path) => config_manager.load_config_from_path(path)?,
        None => config_manager.load_config()?,
    };

    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose)?;
    }

    match args.command {
        Command::Connect(connect_args) => execute_connect(connect_args, &writer, &config).await,
        Command::Send(send_args) => execute_send(send_args, &writer, &config).await,
        Command::EchoServer(server_args) => {
            execute_echo_server(server_args, &writer, &config).await
        }
        Command::Config(config_args) => {
            execute_config_command(config_args.command, &writer, &config, &config_manager)
        }
        Command::Version => {
            writer.write_message(&format!("tcplink {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

/// Report a failed command on stderr in the requested output format
pub fn report_error(format: OutputFormat, error: &TcpLinkError) {
    let writer = ConsoleWriter::new(format);
    if writer.write_error(&error.to_string()).is_err() {
        eprintln!("Error: {}", error);
    }
}

async fn execute_connect(
    args: ConnectArgs,
    writer: &ConsoleWriter,
    config: &TcpLinkConfig,
) -> TcpLinkResult<()> {
    let mut options = DriverOptions::from(&config.client);
    if let Some(host) = args.host {
        options.host = host;
    }
    if let Some(port) = args.port {
        options.port = port;
    }
    if let Some(delay) = args.delay_ms {
        options.message_delay = Duration::from_millis(delay);
    }
    if let Some(max_length) = args.max_length {
        options.max_receive = max_length;
    }

    let messages = if args.messages.is_empty() {
        config.client.messages.clone()
    } else {
        args.messages
    };

    let report = run_blocking(move || run_session(&options, messages.as_slice())).await?;
    finish_report(writer, &report)
}

async fn execute_send(
    args: SendArgs,
    writer: &ConsoleWriter,
    config: &TcpLinkConfig,
) -> TcpLinkResult<()> {
    let payload = parse_data(&args.data, args.format)?;

    let mut options = DriverOptions::from(&config.client);
    if let Some(host) = args.host {
        options.host = host;
    }
    if let Some(port) = args.port {
        options.port = port;
    }
    if let Some(max_length) = args.max_length {
        options.max_receive = max_length;
    }

    let report = run_blocking(move || send_once(&options, &payload)).await?;
    finish_report(writer, &report)
}

async fn execute_echo_server(
    args: EchoServerArgs,
    writer: &ConsoleWriter,
    config: &TcpLinkConfig,
) -> TcpLinkResult<()> {
    let mut server_config = config.server.clone();
    if let Some(bind) = args.bind {
        server_config.bind = bind;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }
    if let Some(prefix) = args.prefix {
        server_config.echo_prefix = prefix;
    }

    let server = EchoServer::bind(&server_config.bind_addr(), server_config.echo_prefix)?;
    writer.write_message(&format!(
        "Test server listening on {}. Press Ctrl+C to shutdown",
        server.local_addr()
    ))?;

    let token = ShutdownToken::new();
    let server_token = token.clone();
    let mut handle = tokio::task::spawn_blocking(move || server.serve(&server_token));

    let joined = tokio::select! {
        joined = &mut handle => joined,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down server...");
            token.cancel();
            handle.await
        }
    };

    let stats = joined.map_err(|e| TcpLinkError::Server {
        message: format!("Server task failed: {}", e),
    })??;
    writer.write_server_stats(&stats)?;
    Ok(())
}

fn execute_config_command(
    command: ConfigCommand,
    writer: &ConsoleWriter,
    config: &TcpLinkConfig,
    config_manager: &ConfigManager,
) -> TcpLinkResult<()> {
    match command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
        }
        ConfigCommand::Path => {
            let global = config_manager
                .get_global_config_path_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no home directory)".to_string());
            writer.write_message(&format!("Global config: {}", global))?;

            match config_manager.get_project_config_path() {
                Some(path) => writer.write_message(&format!("Project config: {}", path.display()))?,
                None => writer.write_message("Project config: (none)")?,
            }
        }
        ConfigCommand::Init { path } => {
            let dir = match path {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            let created = config_manager.init_project_config(&dir)?;
            writer.write_message(&format!("Created {}", created.display()))?;
        }
    }
    Ok(())
}

/// The client blocks, so sessions run off the async workers.
async fn run_blocking<F>(f: F) -> TcpLinkResult<SessionReport>
where
    F: FnOnce() -> SessionReport + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TcpLinkError::Session {
            message: format!("Session task failed: {}", e),
        })
}

fn finish_report(writer: &ConsoleWriter, report: &SessionReport) -> TcpLinkResult<()> {
    writer.write_report(report)?;
    match &report.error {
        Some(error) => Err(TcpLinkError::Session {
            message: format!("{} ({})", error, report.peer),
        }),
        None => Ok(()),
    }
}

fn parse_data(data: &str, format: DataFormat) -> TcpLinkResult<Vec<u8>> {
    match format {
        DataFormat::Text => Ok(data.as_bytes().to_vec()),
        DataFormat::Hex => {
            let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
            hex::decode(&cleaned)
                .map_err(|e| TcpLinkError::InvalidInput(format!("Invalid hex data: {}", e)))
        }
        DataFormat::Base64 => {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| TcpLinkError::InvalidInput(format!("Invalid base64 data: {}", e)))
        }
    }
}
