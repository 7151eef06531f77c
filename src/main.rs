// TcpLink - blocking TCP client and echo test peer
use clap::Parser;
use tcplink::cli::args::Args;
use tcplink::cli::commands::{execute_command, report_error};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let output = args.output;

    if let Err(e) = execute_command(args).await {
        report_error(output, &e);
        std::process::exit(1);
    }
}
