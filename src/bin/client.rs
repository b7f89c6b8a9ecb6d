//! voicewire-client - Native negotiator entry point
//!
//! Headless counterpart of the browser page: fetches the client config
//! and a credential from the token service, then performs the one-shot
//! offer/answer exchange with the realtime endpoint.

use clap::Parser;
use log::{error, info};
use voicewire::negotiator::{Negotiator, NegotiatorConfig};

#[derive(Parser, Debug)]
#[command(name = "voicewire-client")]
#[command(version = "0.1.0")]
#[command(about = "Native negotiator for the realtime voice demo", long_about = None)]
struct ClientArgs {
    /// Token service base URL
    #[arg(long, default_value = "http://localhost:8000")]
    server: String,

    /// Override the model advertised by the token service
    #[arg(long)]
    model: Option<String>,

    /// ICE server URLs (repeatable)
    #[arg(long)]
    ice_server: Vec<String>,

    /// Verbose logging
    #[arg(short, long, action)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ClientArgs::parse();

    // Filter noise from the third-party WebRTC crates
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::new()
        .parse_filters(&std::env::var("VOICEWIRE_LOG").unwrap_or_else(|_| log_level.to_string()))
        .filter_module("webrtc_ice", log::LevelFilter::Error)
        .filter_module("webrtc_dtls", log::LevelFilter::Error)
        .filter_module("webrtc_mdns", log::LevelFilter::Error)
        .init();

    let server = args.server.trim_end_matches('/').to_string();

    let client_config: serde_json::Value = reqwest::get(format!("{}/config", server))
        .await?
        .error_for_status()?
        .json()
        .await?;

    let realtime_url = client_config["realtime_url"]
        .as_str()
        .ok_or("Token service config is missing realtime_url")?
        .to_string();
    let model = args.model.unwrap_or_else(|| {
        client_config["model"]
            .as_str()
            .unwrap_or("gpt-4o-realtime-preview")
            .to_string()
    });

    info!("Negotiating with {} (model {})", realtime_url, model);

    let negotiator = Negotiator::new(NegotiatorConfig {
        session_url: format!("{}/session", server),
        realtime_url,
        model,
        ice_servers: args.ice_server,
    });

    if let Err(e) = negotiator.connect().await {
        error!("Negotiation failed: {}", e);
        return Err(e.into());
    }

    info!("Connected - press Ctrl-C to hang up");
    tokio::signal::ctrl_c().await?;

    negotiator.close().await;
    info!("Closed");
    Ok(())
}
