//! Local audio source for the native negotiator
//!
//! The browser client captures the microphone; headless runs have no
//! capture device, so the native negotiator keeps the sendrecv audio
//! section alive by writing Opus silence frames at the 20 ms frame
//! cadence. The remote side hears silence but the session negotiates
//! and stays up exactly as with a live source.

use bytes::Bytes;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// A single 20 ms Opus silence frame
const OPUS_SILENCE_FRAME: [u8; 3] = [0xf8, 0xff, 0xfe];

/// Opus frame duration used for pacing
const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Spawn a task feeding silence frames into the local track.
///
/// Runs until aborted; writing into an unbound track is a no-op, so the
/// feed can start before negotiation completes.
pub fn spawn_silence_feed(track: Arc<TrackLocalStaticSample>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_DURATION);
        loop {
            ticker.tick().await;
            let sample = Sample {
                data: Bytes::from_static(&OPUS_SILENCE_FRAME),
                duration: FRAME_DURATION,
                ..Default::default()
            };
            if let Err(e) = track.write_sample(&sample).await {
                debug!("Silence feed stopped: {}", e);
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrtc::api::media_engine::MIME_TYPE_OPUS;
    use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;

    fn opus_track() -> Arc<TrackLocalStaticSample> {
        Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_string(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            "audio-test".to_string(),
            "voicewire".to_string(),
        ))
    }

    #[tokio::test]
    async fn unbound_track_accepts_silence() {
        let track = opus_track();
        let sample = Sample {
            data: Bytes::from_static(&OPUS_SILENCE_FRAME),
            duration: FRAME_DURATION,
            ..Default::default()
        };
        assert!(track.write_sample(&sample).await.is_ok());
    }

    #[tokio::test]
    async fn silence_feed_stops_on_abort() {
        let handle = spawn_silence_feed(opus_track());
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
