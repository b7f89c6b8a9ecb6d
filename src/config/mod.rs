//! Configuration management for voicewire

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on credential lifetime accepted by the upstream authority.
pub const MAX_CREDENTIAL_TTL_SECS: u64 = 600;

/// Environment variable holding the upstream identity authority API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Credential issuance configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Upstream realtime service configuration
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// HTTP bind address
    pub host: String,

    /// HTTP port for the token endpoint and web UI
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Credential expiry in seconds, fixed at issuance
    pub expires_in: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: MAX_CREDENTIAL_TTL_SECS,
        }
    }
}

/// Upstream realtime service endpoints and model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Base URL of the upstream identity authority / realtime service
    pub api_base: String,

    /// Realtime model identifier
    pub model: String,

    /// Voice preset forwarded at mint time
    #[serde(default)]
    pub voice: Option<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            model: "gpt-4o-realtime-preview".to_string(),
            voice: None,
        }
    }
}

impl RealtimeConfig {
    /// URL used to mint ephemeral credentials
    pub fn mint_url(&self) -> String {
        format!("{}/v1/realtime/sessions", self.api_base.trim_end_matches('/'))
    }

    /// URL the negotiator posts SDP offers to
    pub fn negotiate_url(&self) -> String {
        format!("{}/v1/realtime", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            session: SessionConfig::default(),
            realtime: RealtimeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file, falling back to defaults when absent
    pub fn load(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.http.port == 0 {
            return Err("HTTP port must be non-zero".into());
        }

        if self.session.expires_in == 0 {
            return Err("Credential expiry must be non-zero".into());
        }

        if self.session.expires_in > MAX_CREDENTIAL_TTL_SECS {
            return Err(format!(
                "Credential expiry cannot exceed {} seconds",
                MAX_CREDENTIAL_TTL_SECS
            )
            .into());
        }

        if self.realtime.model.is_empty() {
            return Err("Realtime model must not be empty".into());
        }

        if !self.realtime.api_base.starts_with("http://")
            && !self.realtime.api_base.starts_with("https://")
        {
            return Err("Realtime api_base must be an http(s) URL".into());
        }

        Ok(())
    }
}

/// Read the upstream authority API key from the environment.
///
/// Missing key is fatal at startup; the value is never mutated afterwards.
pub fn load_api_key() -> Result<String, Box<dyn std::error::Error>> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(format!("Set {} in the environment", API_KEY_ENV).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_defaults() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_expiry() {
        let mut cfg = Config::default();
        cfg.session.expires_in = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_expiry_over_maximum() {
        let mut cfg = Config::default();
        cfg.session.expires_in = MAX_CREDENTIAL_TTL_SECS + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_model() {
        let mut cfg = Config::default();
        cfg.realtime.model.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_api_base() {
        let mut cfg = Config::default();
        cfg.realtime.api_base = "ftp://example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn mint_url_strips_trailing_slash() {
        let mut cfg = RealtimeConfig::default();
        cfg.api_base = "https://api.example.com/".to_string();
        assert_eq!(cfg.mint_url(), "https://api.example.com/v1/realtime/sessions");
        assert_eq!(cfg.negotiate_url(), "https://api.example.com/v1/realtime");
    }
}
