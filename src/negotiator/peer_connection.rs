//! WebRTC PeerConnection setup for the voice negotiator
//!
//! Builds audio-only peer connections: Opus codec, default interceptors,
//! vanilla ICE (the realtime endpoint takes one complete offer, so local
//! candidate gathering finishes before the offer is returned).

use super::NegotiatorError;
use std::sync::Arc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_OPUS};
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecCapability, RTCRtpCodecParameters, RTPCodecType,
};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Builds peer connections for negotiation attempts
pub struct PeerConnector {
    ice_servers: Vec<String>,
}

impl PeerConnector {
    pub fn new(ice_servers: Vec<String>) -> Self {
        Self { ice_servers }
    }

    /// Create a new audio-only PeerConnection
    pub async fn create_peer_connection(
        &self,
    ) -> Result<Arc<RTCPeerConnection>, NegotiatorError> {
        let mut media_engine = MediaEngine::default();
        register_opus_codec(&mut media_engine)?;

        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine).map_err(|e| {
            NegotiatorError::ConnectionFailed(format!("Failed to register interceptors: {}", e))
        })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if self.ice_servers.is_empty() {
            Vec::new()
        } else {
            vec![RTCIceServer {
                urls: self.ice_servers.clone(),
                ..Default::default()
            }]
        };

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = api.new_peer_connection(rtc_config).await.map_err(|e| {
            NegotiatorError::ConnectionFailed(format!("Failed to create peer connection: {}", e))
        })?;

        Ok(Arc::new(peer_connection))
    }

    /// Create the local audio track the silence feed writes into
    pub fn create_audio_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_string(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_string(),
                rtcp_feedback: vec![],
            },
            format!("audio-{}", uuid::Uuid::new_v4()),
            "voicewire".to_string(),
        ))
    }

    /// Create an SDP offer with gathering complete
    pub async fn create_offer(
        peer_connection: &Arc<RTCPeerConnection>,
    ) -> Result<String, NegotiatorError> {
        let offer = peer_connection
            .create_offer(None)
            .await
            .map_err(|e| NegotiatorError::SdpError(format!("Failed to create offer: {}", e)))?;

        let mut gather_complete = peer_connection.gathering_complete_promise().await;

        peer_connection
            .set_local_description(offer)
            .await
            .map_err(|e| {
                NegotiatorError::SdpError(format!("Failed to set local description: {}", e))
            })?;

        let _ = gather_complete.recv().await;

        match peer_connection.local_description().await {
            Some(local_desc) => Ok(local_desc.sdp),
            None => Err(NegotiatorError::SdpError(
                "Local description missing after gathering".to_string(),
            )),
        }
    }

    /// Apply the SDP answer returned by the realtime endpoint
    pub async fn apply_answer(
        peer_connection: &Arc<RTCPeerConnection>,
        sdp: &str,
    ) -> Result<(), NegotiatorError> {
        let answer = RTCSessionDescription::answer(sdp.to_string())
            .map_err(|e| NegotiatorError::SdpError(format!("Invalid SDP answer: {}", e)))?;

        peer_connection
            .set_remote_description(answer)
            .await
            .map_err(|e| {
                NegotiatorError::SdpError(format!("Failed to set remote description: {}", e))
            })?;

        Ok(())
    }

    /// Close a peer connection
    pub async fn close(peer_connection: &Arc<RTCPeerConnection>) -> Result<(), NegotiatorError> {
        peer_connection.close().await.map_err(|e| {
            NegotiatorError::ConnectionFailed(format!("Failed to close connection: {}", e))
        })?;
        Ok(())
    }
}

fn register_opus_codec(media_engine: &mut MediaEngine) -> Result<(), NegotiatorError> {
    media_engine
        .register_codec(
            RTCRtpCodecParameters {
                capability: RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_string(),
                    clock_rate: 48000,
                    channels: 2,
                    sdp_fmtp_line: "minptime=10;useinbandfec=1".to_string(),
                    rtcp_feedback: vec![],
                },
                payload_type: 111,
                ..Default::default()
            },
            RTPCodecType::Audio,
        )
        .map_err(|e| NegotiatorError::ConnectionFailed(format!("Failed to register Opus: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrtc::track::track_local::TrackLocal;

    #[tokio::test]
    async fn offer_carries_audio_section() {
        let connector = PeerConnector::new(Vec::new());
        let pc = connector.create_peer_connection().await.unwrap();
        let track = connector.create_audio_track();
        pc.add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .unwrap();

        let sdp = PeerConnector::create_offer(&pc).await.unwrap();
        assert!(sdp.starts_with("v=0"));
        assert!(sdp.contains("m=audio"));
        assert!(sdp.contains("opus"));

        PeerConnector::close(&pc).await.unwrap();
    }

    #[tokio::test]
    async fn garbage_answer_is_rejected() {
        let connector = PeerConnector::new(Vec::new());
        let pc = connector.create_peer_connection().await.unwrap();

        let result = PeerConnector::apply_answer(&pc, "not an sdp").await;
        assert!(matches!(result, Err(NegotiatorError::SdpError(_))));

        PeerConnector::close(&pc).await.unwrap();
    }
}
