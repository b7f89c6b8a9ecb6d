//! Client negotiator for the realtime voice service
//!
//! Implements the one-shot offer/answer handshake:
//! fetch an ephemeral credential, create a peer connection with a local
//! audio track and an `oai-events` data channel, post the SDP offer to
//! the realtime endpoint with the credential as bearer auth, and apply
//! the returned answer.

pub mod audio;
pub mod flow;
pub mod peer_connection;
pub mod state;

pub use flow::{Negotiator, NegotiatorConfig};
pub use state::ConnectionState;

use std::error::Error;
use std::fmt;

/// Negotiation errors
#[derive(Debug)]
pub enum NegotiatorError {
    /// A connection attempt is already in flight
    AttemptInProgress,
    /// Invalid state transition
    InvalidState(String),
    /// Token service call failed or returned an unusable credential
    CredentialFetch(String),
    /// Peer connection creation or establishment failed
    ConnectionFailed(String),
    /// SDP processing failed
    SdpError(String),
    /// Offer/answer exchange with the realtime endpoint failed
    NegotiationFailed(String),
    /// Local audio source failed
    MediaError(String),
}

impl fmt::Display for NegotiatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegotiatorError::AttemptInProgress => {
                write!(f, "A connection attempt is already in progress")
            }
            NegotiatorError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            NegotiatorError::CredentialFetch(msg) => {
                write!(f, "Credential fetch failed: {}", msg)
            }
            NegotiatorError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            NegotiatorError::SdpError(msg) => write!(f, "SDP error: {}", msg),
            NegotiatorError::NegotiationFailed(msg) => write!(f, "Negotiation failed: {}", msg),
            NegotiatorError::MediaError(msg) => write!(f, "Media error: {}", msg),
        }
    }
}

impl Error for NegotiatorError {}
