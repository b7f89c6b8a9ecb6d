//! Connection attempt state machine
//!
//! One flow per user action: `idle → fetching-credential → connecting →
//! connected | failed`. Every attempt carries a UUID and the guard
//! rejects a new attempt while one is in flight, so overlapping
//! triggers cannot interleave two handshakes.

use super::NegotiatorError;
use std::sync::Mutex;
use uuid::Uuid;

/// Negotiator connection states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    FetchingCredential,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::FetchingCredential => "fetching-credential",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }

    /// Whether a new attempt may start from this state
    pub fn can_begin(&self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::Failed)
    }

    fn can_advance_to(&self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (
                ConnectionState::FetchingCredential,
                ConnectionState::Connecting | ConnectionState::Failed
            ) | (
                ConnectionState::Connecting,
                ConnectionState::Connected | ConnectionState::Failed
            ) | (ConnectionState::Connected, ConnectionState::Failed)
        )
    }
}

struct GuardInner {
    state: ConnectionState,
    attempt: Option<Uuid>,
}

/// State guard for connection attempts.
///
/// Transitions are only accepted from the attempt that owns the flow;
/// a stale attempt id is rejected.
pub struct AttemptGuard {
    inner: Mutex<GuardInner>,
}

impl AttemptGuard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(GuardInner {
                state: ConnectionState::Idle,
                attempt: None,
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().unwrap().state
    }

    /// Start a new attempt, entering `fetching-credential`
    pub fn begin(&self) -> Result<Uuid, NegotiatorError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.state.can_begin() {
            return Err(NegotiatorError::AttemptInProgress);
        }
        let attempt = Uuid::new_v4();
        inner.state = ConnectionState::FetchingCredential;
        inner.attempt = Some(attempt);
        Ok(attempt)
    }

    /// Advance the owning attempt to the next state
    pub fn advance(&self, attempt: Uuid, next: ConnectionState) -> Result<(), NegotiatorError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.attempt != Some(attempt) {
            return Err(NegotiatorError::InvalidState(format!(
                "attempt {} does not own the flow",
                attempt
            )));
        }
        if !inner.state.can_advance_to(next) {
            return Err(NegotiatorError::InvalidState(format!(
                "cannot transition from {} to {}",
                inner.state.as_str(),
                next.as_str()
            )));
        }
        inner.state = next;
        Ok(())
    }

    /// Mark the owning attempt failed. A stale attempt id is a no-op.
    pub fn fail(&self, attempt: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        if inner.attempt == Some(attempt) {
            inner.state = ConnectionState::Failed;
        }
    }

    /// Return to idle after the user hangs up, releasing the attempt
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = ConnectionState::Idle;
        inner.attempt = None;
    }
}

impl Default for AttemptGuard {
    fn default() -> Self {
        Self::new()
    }
}
