//! noughts-server: two-player noughts and crosses over WebSocket.
//!
//! Clients create and join games from a shared lobby, then exchange moves
//! as JSON envelopes; the server arbitrates turns, wins and ties.

mod config;
mod connection;
mod router;
mod server;
mod session;
mod transport;

use clap::Parser;
use config::ServerConfig;
use server::NoughtsServer;
use std::path::PathBuf;
use tracing::{error, info};

/// noughts-server — noughts and crosses game server
#[derive(Parser, Debug)]
#[command(name = "noughts-server", version, about = "Noughts and crosses game server")]
struct Cli {
    /// Listen address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path
    #[arg(long, default_value = "~/.noughts/config.toml")]
    config: String,

    /// Board edge length
    #[arg(long)]
    board_size: Option<usize>,

    /// Maximum concurrent games
    #[arg(long)]
    max_sessions: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting noughts-server");

    let config_path = PathBuf::from(&cli.config);
    let server_config = match ServerConfig::load(
        Some(&config_path),
        cli.host.as_deref(),
        cli.port,
        cli.board_size,
        cli.max_sessions,
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let noughts_server = NoughtsServer::new(server_config);

    tokio::select! {
        result = noughts_server.run() => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
        }
    }

    info!("noughts-server stopped");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
