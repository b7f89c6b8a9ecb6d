use clap::Parser;
use std::path::PathBuf;

use crate::config;

#[derive(Parser, Debug)]
#[command(name = "voicewire")]
#[command(version = "0.1.0")]
#[command(about = "Ephemeral token service for realtime voice over WebRTC", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "voicewire.toml")]
    pub config: PathBuf,

    /// HTTP bind address
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port for the token endpoint and web UI
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Realtime model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Credential expiry in seconds (max 600)
    #[arg(long)]
    pub expires_in: Option<u64>,

    /// Verbose logging
    #[arg(short, long, action)]
    pub verbose: bool,
}

impl Args {
    pub fn load_config(&self) -> Result<config::Config, Box<dyn std::error::Error>> {
        config::Config::load(&self.config)
    }

    /// Apply command line overrides on top of a loaded config
    pub fn apply_overrides(&self, config: &mut config::Config) {
        if let Some(ref host) = self.host {
            config.http.host = host.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(ref model) = self.model {
            config.realtime.model = model.clone();
        }
        if let Some(expires_in) = self.expires_in {
            config.session.expires_in = expires_in;
        }
    }
}
