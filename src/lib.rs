//! voicewire - Realtime voice over WebRTC
//!
//! An ephemeral token service plus a client negotiator for an
//! OpenAI-style realtime voice API.

pub mod args;
pub mod config;
pub mod negotiator;
pub mod token;
pub mod web;

// Re-exports
pub use config::{Config, HttpConfig, RealtimeConfig, SessionConfig};
pub use negotiator::{ConnectionState, Negotiator, NegotiatorError};
pub use token::{TokenError, TokenMinter};
