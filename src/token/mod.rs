//! Ephemeral credential issuance
//!
//! Mints short-lived bearer tokens from the upstream identity authority.
//! The service holds no state: every mint is an independent upstream call
//! and the credential is returned to the caller as-is.

pub mod minter;

pub use minter::TokenMinter;

use std::error::Error;
use std::fmt;

/// Credential issuance errors
#[derive(Debug)]
pub enum TokenError {
    /// Upstream authority could not be reached
    Transport(String),
    /// Upstream authority rejected the mint request
    Upstream(String),
    /// Upstream response did not carry a usable credential
    Malformed(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Transport(msg) => write!(f, "Transport error: {}", msg),
            TokenError::Upstream(msg) => write!(f, "Upstream rejected mint: {}", msg),
            TokenError::Malformed(msg) => write!(f, "Malformed credential: {}", msg),
        }
    }
}

impl Error for TokenError {}
