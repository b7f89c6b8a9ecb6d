//! Shared state for the token service

use crate::config::Config;
use crate::token::TokenMinter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared state for the HTTP server
pub struct SharedState {
    /// Configuration
    pub config: Arc<Config>,

    /// Credential minter
    pub minter: TokenMinter,

    /// Server start time
    pub start_time: Instant,

    /// Credentials issued since startup
    pub credentials_issued: AtomicU64,
}

impl SharedState {
    pub fn new(config: Arc<Config>, minter: TokenMinter) -> Self {
        Self {
            config,
            minter,
            start_time: Instant::now(),
            credentials_issued: AtomicU64::new(0),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn record_issuance(&self) {
        self.credentials_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn issued_count(&self) -> u64 {
        self.credentials_issued.load(Ordering::Relaxed)
    }
}
