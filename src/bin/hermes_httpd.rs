//! Hermes HTTPD Binary
//!
//! Static file server di atas event loop edge-triggered.
//!
//! Usage:
//!   cargo run --release --bin hermes_httpd -- [OPTIONS]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, Level};

use hermes_httpd::config::{
    DEFAULT_DOCUMENT, DEFAULT_DOCUMENT_ROOT, DEFAULT_INPUT_BUFFER_SIZE, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_EVENTS, DEFAULT_PORT,
};
use hermes_httpd::network::install_signal_handlers;
use hermes_httpd::{Server, ServerConfig, ShutdownToken, StartupError};

/// Single-threaded static file server
#[derive(Debug, Parser)]
#[command(name = "hermes_httpd", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind (all interfaces by default)
    #[arg(short, long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Document root
    #[arg(short, long, default_value = DEFAULT_DOCUMENT_ROOT)]
    root: PathBuf,

    /// File served for `/`
    #[arg(long, default_value = DEFAULT_DOCUMENT)]
    index: String,

    /// Connection pool capacity
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Per-connection request buffer in bytes
    #[arg(long, default_value_t = DEFAULT_INPUT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Maximum readiness events per wait
    #[arg(long, default_value_t = DEFAULT_MAX_EVENTS)]
    max_events: usize,

    /// Wait timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_timeout_ms: u64,

    /// Seconds between status lines
    #[arg(long, default_value_t = 10)]
    status_interval_secs: u64,

    /// SO_SNDBUF for accepted sockets, in bytes
    #[arg(long)]
    send_buffer: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            listen_addr: SocketAddr::new(cli.bind, cli.port),
            document_root: cli.root,
            default_document: cli.index,
            max_connections: cli.max_connections,
            input_buffer_size: cli.buffer_size,
            max_events: cli.max_events,
            poll_timeout: Duration::from_millis(cli.poll_timeout_ms),
            status_interval: Duration::from_secs(cli.status_interval_secs),
            send_buffer_size: cli.send_buffer,
        }
    }
}

fn run(config: ServerConfig) -> Result<(), StartupError> {
    let shutdown = ShutdownToken::new();
    install_signal_handlers(&shutdown).map_err(StartupError::Signal)?;

    let server = Server::bind(config, shutdown)?;
    server.run();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(cli.into()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}
