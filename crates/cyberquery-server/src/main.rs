//! CyberQuery Server CLI
//!
//! Starts the HTTP server for the security assistant.

use clap::Parser;
use cyberquery_server::{config::ServerConfig, start_server, ServerError, StartOptions};
use std::path::PathBuf;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// CyberQuery - retrieval-augmented assistant for security tooling
#[derive(Parser, Debug)]
#[command(name = "cyberquery-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Load configuration from a TOML file
    #[arg(short, long, env = "CYBERQUERY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "cyberquery_rag=trace")
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Build the semantic index before serving
    #[arg(long)]
    rebuild_index: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            warn!("No config file specified, using defaults");
            ServerConfig::default()
        }
    };
    config = config.with_env_overrides();

    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(port) = cli.port {
        config.bind_port = port;
    }

    let options = StartOptions {
        build_index: cli.rebuild_index,
    };
    start_server(config, options).await
}
