//! voicewire - Token service entry point
//!
//! Serves the ephemeral credential endpoint and the embedded browser
//! client for the realtime voice demo.

use clap::Parser;
use log::{error, info, warn};
use std::sync::Arc;
use voicewire::args::Args;
use voicewire::config::{self, Config};
use voicewire::token::TokenMinter;
use voicewire::web::{run_http_server, SharedState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::new()
        .parse_filters(&std::env::var("VOICEWIRE_LOG").unwrap_or_else(|_| log_level.to_string()))
        .init();

    info!("voicewire v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match args.load_config() {
        Ok(cfg) => {
            info!("Loaded configuration from {:?}", args.config);
            cfg
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };

    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    // Missing API key is fatal before serving anything
    let api_key = match config::load_api_key() {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    };

    info!(
        "Minting credentials for model {} (expiry {}s)",
        config.realtime.model, config.session.expires_in
    );

    let config = Arc::new(config);
    let minter = TokenMinter::new(&config, api_key);
    let state = Arc::new(SharedState::new(config, minter));

    run_http_server(state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");
    })
    .await
}
