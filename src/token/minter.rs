//! Token minting against the upstream identity authority
//!
//! One outbound request per mint, no retry. The upstream JSON is passed
//! through untouched so the browser client sees the exact credential
//! object the authority issued.

use super::TokenError;
use crate::config::Config;
use log::info;
use serde_json::{json, Value};
use std::time::Duration;

/// Mints ephemeral credentials for the realtime service.
///
/// Holds the long-lived API key loaded at startup; the key never leaves
/// the process and is never echoed into responses or logs.
#[derive(Clone)]
pub struct TokenMinter {
    http: reqwest::Client,
    mint_url: String,
    api_key: String,
    model: String,
    voice: Option<String>,
    expires_in: u64,
}

impl TokenMinter {
    pub fn new(config: &Config, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            mint_url: config.realtime.mint_url(),
            api_key,
            model: config.realtime.model.clone(),
            voice: config.realtime.voice.clone(),
            expires_in: config.session.expires_in,
        }
    }

    /// Configured credential lifetime in seconds
    pub fn expires_in(&self) -> u64 {
        self.expires_in
    }

    /// Mint one ephemeral credential.
    ///
    /// Returns the upstream JSON as-is after checking it carries a
    /// non-empty `client_secret.value`.
    pub async fn mint(&self) -> Result<Value, TokenError> {
        let mut body = json!({
            "model": self.model,
            "expires_in": self.expires_in,
        });
        if let Some(ref voice) = self.voice {
            body["voice"] = json!(voice);
        }

        let response = self
            .http
            .post(&self.mint_url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(10))
            .json(&body)
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(TokenError::Upstream(format!("{}: {}", status, text)));
        }

        let credential: Value =
            serde_json::from_str(&text).map_err(|e| TokenError::Malformed(e.to_string()))?;

        let secret = credential
            .pointer("/client_secret/value")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if secret.is_empty() {
            return Err(TokenError::Malformed(
                "missing client_secret.value".to_string(),
            ));
        }

        info!(
            "Issued ephemeral credential (expires_in {}s)",
            self.expires_in
        );
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::routing::post;
    use axum::{http::StatusCode, Json, Router};
    use std::net::SocketAddr;

    async fn spawn_authority(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn minter_for(addr: SocketAddr) -> TokenMinter {
        let mut config = Config::default();
        config.realtime.api_base = format!("http://{}", addr);
        TokenMinter::new(&config, "sk-test".to_string())
    }

    #[tokio::test]
    async fn mint_passes_upstream_credential_through() {
        let router = Router::new().route(
            "/v1/realtime/sessions",
            post(|| async {
                Json(serde_json::json!({
                    "client_secret": { "value": "abc123", "expires_in": 600 }
                }))
            }),
        );
        let addr = spawn_authority(router).await;

        let credential = minter_for(addr).mint().await.unwrap();
        assert_eq!(
            credential.pointer("/client_secret/value").unwrap(),
            "abc123"
        );
        assert_eq!(
            credential.pointer("/client_secret/expires_in").unwrap(),
            600
        );
    }

    #[tokio::test]
    async fn mint_surfaces_upstream_rejection() {
        let router = Router::new().route(
            "/v1/realtime/sessions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = spawn_authority(router).await;

        let err = minter_for(addr).mint().await.unwrap_err();
        assert!(matches!(err, TokenError::Upstream(_)));
    }

    #[tokio::test]
    async fn mint_fails_when_authority_unreachable() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = minter_for(addr).mint().await.unwrap_err();
        assert!(matches!(err, TokenError::Transport(_)));
    }

    #[tokio::test]
    async fn mint_rejects_credential_without_secret() {
        let router = Router::new().route(
            "/v1/realtime/sessions",
            post(|| async { Json(serde_json::json!({ "client_secret": { "value": "" } })) }),
        );
        let addr = spawn_authority(router).await;

        let err = minter_for(addr).mint().await.unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }
}
