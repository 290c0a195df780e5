//! Transcript persistence, gated on an authenticated session.
//!
//! Saves overwrite the whole record; restores rebuild a `ChatState` from
//! the stored transcript. Without a session both directions silently
//! no-op, matching the save-only-when-signed-in behavior of the chat UI.

use graphchat_core::error::Result;
use graphchat_core::message::{ChatHandle, ChatId, ChatState};
use graphchat_core::session::SessionProvider;
use graphchat_core::store::{ChatRecord, ChatStore};
use tracing::debug;

/// Save the chat's current transcript if a session is present.
pub async fn save_transcript(
    chat: &ChatHandle,
    store: &dyn ChatStore,
    sessions: &dyn SessionProvider,
) -> Result<()> {
    let Some(session) = sessions.current().await else {
        debug!(chat_id = %chat.id(), "No session, skipping persistence");
        return Ok(());
    };

    let state = chat.snapshot().await;
    let record = ChatRecord::from_state(&state, session.user_id);
    store.save(record).await?;
    Ok(())
}

/// Restore a stored transcript as live chat state.
///
/// Returns `None` when there is no session or no such chat.
pub async fn restore(
    id: &ChatId,
    store: &dyn ChatStore,
    sessions: &dyn SessionProvider,
) -> Result<Option<ChatState>> {
    if sessions.current().await.is_none() {
        debug!(chat_id = %id, "No session, skipping restore");
        return Ok(None);
    }

    let Some(record) = store.load(id).await? else {
        return Ok(None);
    };

    Ok(Some(ChatState {
        id: record.id,
        messages: record.messages,
        created_at: record.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphchat_core::message::Message;
    use graphchat_storage::{AnonymousSessionProvider, InMemoryChatStore, StaticSessionProvider};

    #[tokio::test]
    async fn save_then_restore_roundtrip() {
        let store = InMemoryChatStore::new();
        let sessions = StaticSessionProvider::new("alice");
        let chat = ChatHandle::default();
        chat.append(Message::user("remember this")).await;

        save_transcript(&chat, &store, &sessions).await.unwrap();

        let restored = restore(chat.id(), &store, &sessions).await.unwrap().unwrap();
        assert_eq!(restored.id, *chat.id());
        assert_eq!(restored.messages.len(), 1);
    }

    #[tokio::test]
    async fn anonymous_save_is_a_silent_noop() {
        let store = InMemoryChatStore::new();
        let chat = ChatHandle::default();
        chat.append(Message::user("ephemeral")).await;

        save_transcript(&chat, &store, &AnonymousSessionProvider)
            .await
            .unwrap();

        // Even a signed-in reader finds nothing
        let sessions = StaticSessionProvider::new("alice");
        assert!(restore(chat.id(), &store, &sessions).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn anonymous_restore_is_a_silent_noop() {
        let store = InMemoryChatStore::new();
        let sessions = StaticSessionProvider::new("alice");
        let chat = ChatHandle::default();
        chat.append(Message::user("saved")).await;
        save_transcript(&chat, &store, &sessions).await.unwrap();

        let result = restore(chat.id(), &store, &AnonymousSessionProvider)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn title_is_truncated_to_100_chars_on_save() {
        let store = InMemoryChatStore::new();
        let sessions = StaticSessionProvider::new("alice");
        let chat = ChatHandle::default();
        chat.append(Message::user("q".repeat(300))).await;

        save_transcript(&chat, &store, &sessions).await.unwrap();

        let record = store.load(chat.id()).await.unwrap().unwrap();
        assert_eq!(record.title.chars().count(), 100);
        assert_eq!(record.path, format!("/chat/{}", chat.id()));
    }
}
