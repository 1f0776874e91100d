//! Cartela API server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cartela::api::server::ApiServer;
use cartela::clock::SystemClock;
use cartela::config::CartelaConfig;
use cartela::engine::GameEngine;
use cartela::ledger::WalletLedger;
use cartela::users::InMemoryUsers;

#[derive(Parser, Debug)]
#[command(name = "cartela-api")]
#[command(about = "Cartela bingo session server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// API server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// API server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CartelaConfig::load(path)?,
        None => CartelaConfig::default(),
    };

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(origins) = args.cors_origins {
        config.server.allowed_origins = origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
    }
    if let Some(timeout) = args.timeout {
        config.server.request_timeout_secs = timeout;
    }
    config.validate()?;

    let engine = Arc::new(GameEngine::new(
        config.game.clone(),
        Arc::new(WalletLedger::new()),
        Arc::new(InMemoryUsers::new()),
        Arc::new(SystemClock),
    ));

    let server = ApiServer::new(config.server.clone(), engine);
    server.run().await?;

    Ok(())
}
