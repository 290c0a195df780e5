//! Chat persistence trait.
//!
//! A `ChatStore` durably saves completed transcripts keyed by chat id.
//! Implementations live in the storage crate (in-memory for tests, a
//! file-per-chat store for real use).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::message::{ChatId, ChatState, Message};

/// A persisted chat: transcript plus the listing metadata derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: ChatId,

    /// Derived from the first user message, truncated for listings
    pub title: String,

    /// Owner of the chat; persistence is gated on having one
    pub user_id: String,

    pub created_at: DateTime<Utc>,

    pub messages: Vec<Message>,

    /// Canonical client route for this chat, e.g. `/chat/{id}`
    pub path: String,
}

impl ChatRecord {
    /// Build a record from a chat snapshot. The title is the first user
    /// message cut to at most 100 characters, on a character boundary.
    pub fn from_state(state: &ChatState, user_id: impl Into<String>) -> Self {
        let title = state
            .first_user_text()
            .unwrap_or("New chat")
            .chars()
            .take(100)
            .collect();
        Self {
            path: format!("/chat/{}", state.id),
            id: state.id.clone(),
            title,
            user_id: user_id.into(),
            created_at: state.created_at,
            messages: state.messages.clone(),
        }
    }
}

/// Durable storage for chat transcripts.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Save a record, overwriting any previous version of the same chat.
    async fn save(&self, record: ChatRecord) -> std::result::Result<(), StoreError>;

    /// Load a chat by id. `Ok(None)` when the chat does not exist.
    async fn load(&self, id: &ChatId) -> std::result::Result<Option<ChatRecord>, StoreError>;

    /// List a user's chats, most recent first.
    async fn list(&self, user_id: &str) -> std::result::Result<Vec<ChatRecord>, StoreError>;

    /// Delete a chat. Deleting a missing chat is not an error.
    async fn delete(&self, id: &ChatId) -> std::result::Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_title_comes_from_first_user_message() {
        let mut state = ChatState::new();
        state.push(Message::user("what is the total GRT supply?"));
        state.push(Message::assistant("Let me check."));
        let record = ChatRecord::from_state(&state, "user-1");
        assert_eq!(record.title, "what is the total GRT supply?");
        assert_eq!(record.path, format!("/chat/{}", state.id));
    }

    #[test]
    fn record_title_truncates_to_100_chars() {
        let mut state = ChatState::new();
        state.push(Message::user("x".repeat(250)));
        let record = ChatRecord::from_state(&state, "user-1");
        assert_eq!(record.title.chars().count(), 100);
    }

    #[test]
    fn record_title_truncation_respects_char_boundaries() {
        let mut state = ChatState::new();
        state.push(Message::user("é".repeat(150)));
        let record = ChatRecord::from_state(&state, "user-1");
        assert_eq!(record.title.chars().count(), 100);
        assert!(record.title.chars().all(|c| c == 'é'));
    }

    #[test]
    fn record_without_user_text_gets_default_title() {
        let state = ChatState::new();
        let record = ChatRecord::from_state(&state, "user-1");
        assert_eq!(record.title, "New chat");
    }
}
