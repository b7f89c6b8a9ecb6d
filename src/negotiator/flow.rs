//! Connection flow: credential fetch, then one-shot offer/answer
//!
//! A flow runs to completion or failure; there is no cancellation, no
//! automatic retry and no timeout of our own beyond the transport's.
//! Exactly one credential is fetched per attempt and consumed once as
//! bearer auth for the offer exchange.

use super::audio::spawn_silence_feed;
use super::peer_connection::PeerConnector;
use super::state::{AttemptGuard, ConnectionState};
use super::NegotiatorError;
use log::{error, info};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::track::track_local::TrackLocal;

/// Endpoints and model for one negotiator instance
#[derive(Debug, Clone)]
pub struct NegotiatorConfig {
    /// Token service URL, e.g. `http://localhost:8000/session`
    pub session_url: String,

    /// Realtime negotiation endpoint, e.g. `https://api.openai.com/v1/realtime`
    pub realtime_url: String,

    /// Model identifier appended as `?model=`
    pub model: String,

    /// ICE server URLs; empty means host candidates only
    pub ice_servers: Vec<String>,
}

/// Ephemeral bearer credential, consumed by exactly one offer exchange
struct Credential {
    value: String,
}

/// Native client negotiator.
///
/// Drives the `idle → fetching-credential → connecting → connected |
/// failed` state machine; overlapping `connect()` calls are rejected by
/// the attempt guard.
pub struct Negotiator {
    config: NegotiatorConfig,
    http: reqwest::Client,
    guard: AttemptGuard,
    connector: PeerConnector,
    peer: Mutex<Option<Arc<RTCPeerConnection>>>,
    silence_task: Mutex<Option<JoinHandle<()>>>,
}

impl Negotiator {
    pub fn new(config: NegotiatorConfig) -> Self {
        let connector = PeerConnector::new(config.ice_servers.clone());
        Self {
            config,
            http: reqwest::Client::new(),
            guard: AttemptGuard::new(),
            connector,
            peer: Mutex::new(None),
            silence_task: Mutex::new(None),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.guard.state()
    }

    /// Run one connection attempt to completion or failure.
    ///
    /// On failure the flow lands in `failed` and the caller must
    /// re-trigger; nothing retries on its own.
    pub async fn connect(&self) -> Result<(), NegotiatorError> {
        let attempt = self.guard.begin()?;
        info!("Connection attempt {} started", attempt);

        let credential = match self.fetch_credential().await {
            Ok(credential) => credential,
            Err(e) => {
                error!("Credential fetch failed: {}", e);
                self.guard.fail(attempt);
                return Err(e);
            }
        };

        self.guard.advance(attempt, ConnectionState::Connecting)?;

        match self.negotiate(attempt, credential).await {
            Ok(()) => {
                self.guard.advance(attempt, ConnectionState::Connected)?;
                info!("Connection attempt {} established", attempt);
                Ok(())
            }
            Err(e) => {
                error!("Connection attempt {} failed: {}", attempt, e);
                self.guard.fail(attempt);
                self.teardown().await;
                Err(e)
            }
        }
    }

    /// Close the peer connection, stop the audio feed and return to idle
    pub async fn close(&self) {
        self.teardown().await;
        self.guard.reset();
    }

    /// Fetch one ephemeral credential from the token service
    async fn fetch_credential(&self) -> Result<Credential, NegotiatorError> {
        let response = self
            .http
            .get(&self.config.session_url)
            .send()
            .await
            .map_err(|e| NegotiatorError::CredentialFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NegotiatorError::CredentialFetch(format!(
                "{}: {}",
                status, body
            )));
        }

        let credential: serde_json::Value = response
            .json()
            .await
            .map_err(|e| NegotiatorError::CredentialFetch(e.to_string()))?;

        let value = credential
            .pointer("/client_secret/value")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if value.is_empty() {
            return Err(NegotiatorError::CredentialFetch(
                "credential missing bearer value".to_string(),
            ));
        }

        info!("Ephemeral credential received");
        Ok(Credential {
            value: value.to_string(),
        })
    }

    /// One-shot offer/answer exchange, consuming the credential
    async fn negotiate(
        &self,
        attempt: Uuid,
        credential: Credential,
    ) -> Result<(), NegotiatorError> {
        let pc = self.connector.create_peer_connection().await?;
        *self.peer.lock().await = Some(Arc::clone(&pc));

        let (state_tx, mut state_rx) = tokio::sync::mpsc::unbounded_channel();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let state_tx = state_tx.clone();
            Box::pin(async move {
                let _ = state_tx.send(state);
            })
        }));

        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            Box::pin(async move {
                info!("Remote {} track arrived: {}", track.kind(), track.id());
            })
        }));

        // Control channel for inbound event messages
        let data_channel = pc
            .create_data_channel("oai-events", None)
            .await
            .map_err(|e| {
                NegotiatorError::ConnectionFailed(format!("Failed to create data channel: {}", e))
            })?;
        data_channel.on_message(Box::new(move |message: DataChannelMessage| {
            Box::pin(async move {
                match String::from_utf8(message.data.to_vec()) {
                    Ok(text) => info!("Event: {}", text),
                    Err(_) => info!("Event: {} binary bytes", message.data.len()),
                }
            })
        }));

        // Local audio: silence frames stand in for a capture device
        let track = self.connector.create_audio_track();
        pc.add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| NegotiatorError::MediaError(format!("Failed to add track: {}", e)))?;
        *self.silence_task.lock().await = Some(spawn_silence_feed(track));

        let offer_sdp = PeerConnector::create_offer(&pc).await?;

        let url = format!("{}?model={}", self.config.realtime_url, self.config.model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&credential.value)
            .header(CONTENT_TYPE, "application/sdp")
            .body(offer_sdp)
            .send()
            .await
            .map_err(|e| NegotiatorError::NegotiationFailed(e.to_string()))?;

        let status = response.status();
        let answer_sdp = response
            .text()
            .await
            .map_err(|e| NegotiatorError::NegotiationFailed(e.to_string()))?;
        if !status.is_success() {
            return Err(NegotiatorError::NegotiationFailed(format!(
                "{}: {}",
                status, answer_sdp
            )));
        }

        PeerConnector::apply_answer(&pc, &answer_sdp).await?;
        info!("Answer applied for attempt {}, waiting for media", attempt);

        while let Some(state) = state_rx.recv().await {
            info!("Peer connection state: {}", state);
            match state {
                RTCPeerConnectionState::Connected => return Ok(()),
                RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed => {
                    return Err(NegotiatorError::ConnectionFailed(format!(
                        "peer connection reached {}",
                        state
                    )));
                }
                _ => {}
            }
        }

        Err(NegotiatorError::ConnectionFailed(
            "peer connection state stream ended".to_string(),
        ))
    }

    async fn teardown(&self) {
        if let Some(task) = self.silence_task.lock().await.take() {
            task.abort();
        }
        if let Some(pc) = self.peer.lock().await.take() {
            if let Err(e) = PeerConnector::close(&pc).await {
                error!("Peer connection close failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::net::SocketAddr;
    use std::time::Duration;

    async fn spawn_token_service(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn negotiator_for(session_url: String) -> Negotiator {
        Negotiator::new(NegotiatorConfig {
            session_url,
            realtime_url: "http://127.0.0.1:1/v1/realtime".to_string(),
            model: "gpt-4o-realtime-preview".to_string(),
            ice_servers: Vec::new(),
        })
    }

    #[tokio::test]
    async fn unreachable_token_service_fails_the_flow() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let negotiator = negotiator_for(format!("http://{}/session", addr));
        let err = negotiator.connect().await.unwrap_err();
        assert!(matches!(err, NegotiatorError::CredentialFetch(_)));
        assert_eq!(negotiator.state(), ConnectionState::Failed);

        // The guard resets on failure: the user can re-trigger
        let err = negotiator.connect().await.unwrap_err();
        assert!(matches!(err, NegotiatorError::CredentialFetch(_)));
    }

    #[tokio::test]
    async fn credential_without_bearer_value_fails_before_connecting() {
        let router = Router::new().route(
            "/session",
            get(|| async { Json(serde_json::json!({ "client_secret": { "value": "" } })) }),
        );
        let addr = spawn_token_service(router).await;

        let negotiator = negotiator_for(format!("http://{}/session", addr));
        let err = negotiator.connect().await.unwrap_err();

        // Failure happens in fetching-credential: no offer was ever built
        assert!(matches!(err, NegotiatorError::CredentialFetch(_)));
        assert_eq!(negotiator.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn connecting_stage_failure_lands_in_failed() {
        let router = Router::new().route(
            "/session",
            get(|| async {
                Json(serde_json::json!({ "client_secret": { "value": "abc123" } }))
            }),
        );
        let addr = spawn_token_service(router).await;

        // Valid credential, but nothing listens on the realtime endpoint:
        // the flow enters connecting, builds the offer, and fails at the
        // offer exchange rather than hanging
        let negotiator = negotiator_for(format!("http://{}/session", addr));
        let err = negotiator.connect().await.unwrap_err();
        assert!(matches!(err, NegotiatorError::NegotiationFailed(_)));
        assert_eq!(negotiator.state(), ConnectionState::Failed);

        // Hanging up releases the flow entirely
        negotiator.close().await;
        assert_eq!(negotiator.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn overlapping_connect_is_rejected() {
        let router = Router::new().route(
            "/session",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Json(serde_json::json!({ "client_secret": { "value": "" } }))
            }),
        );
        let addr = spawn_token_service(router).await;

        let negotiator = Arc::new(negotiator_for(format!("http://{}/session", addr)));
        let first = {
            let negotiator = Arc::clone(&negotiator);
            tokio::spawn(async move { negotiator.connect().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let err = negotiator.connect().await.unwrap_err();
        assert!(matches!(err, NegotiatorError::AttemptInProgress));

        let first_result = first.await.unwrap();
        assert!(first_result.is_err());
        assert_eq!(negotiator.state(), ConnectionState::Failed);
    }

    #[tokio::test]
    async fn token_service_error_body_is_surfaced() {
        let router = Router::new().route(
            "/session",
            get(|| async {
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Realtime token request failed",
                )
            }),
        );
        let addr = spawn_token_service(router).await;

        let negotiator = negotiator_for(format!("http://{}/session", addr));
        let err = negotiator.connect().await.unwrap_err();
        match err {
            NegotiatorError::CredentialFetch(msg) => {
                assert!(msg.contains("Realtime token request failed"));
            }
            other => panic!("expected CredentialFetch, got {:?}", other),
        }
    }
}
