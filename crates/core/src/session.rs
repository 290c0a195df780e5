//! Session identity.
//!
//! Persistence is gated on an authenticated session: no session, no save.
//! The trait keeps the auth source out of the orchestrator; the storage
//! crate ships a static provider for single-user deployments and an
//! anonymous one that disables persistence.

use async_trait::async_trait;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Source of the current session, if any.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session. `None` means unauthenticated, which disables
    /// chat persistence.
    async fn current(&self) -> Option<Session>;
}
