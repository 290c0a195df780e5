//! Session providers.

use async_trait::async_trait;
use graphchat_core::session::{Session, SessionProvider};

/// Always reports the same user. Single-user deployments and the CLI
/// use this so their chats persist.
pub struct StaticSessionProvider {
    session: Session,
}

impl StaticSessionProvider {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            session: Session::new(user_id),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current(&self) -> Option<Session> {
        Some(self.session.clone())
    }
}

/// Never reports a session: chats are usable but nothing persists.
pub struct AnonymousSessionProvider;

#[async_trait]
impl SessionProvider for AnonymousSessionProvider {
    async fn current(&self) -> Option<Session> {
        None
    }
}
