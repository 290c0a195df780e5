//! File-backed chat store: one JSON document per chat.
//!
//! Layout: `{data_dir}/{chat_id}.json`. Saves overwrite the whole
//! document; the transcript is small enough that rewriting beats
//! incremental formats.

use async_trait::async_trait;
use graphchat_core::error::StoreError;
use graphchat_core::message::ChatId;
use graphchat_core::store::{ChatRecord, ChatStore};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileChatStore {
    data_dir: PathBuf,
}

impl FileChatStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| StoreError::Storage(format!("create {}: {e}", data_dir.display())))?;
        Ok(Self { data_dir })
    }

    fn chat_path(&self, id: &ChatId) -> PathBuf {
        self.data_dir.join(format!("{id}.json"))
    }

    fn read_record(path: &Path) -> Result<ChatRecord, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Storage(format!("read {}: {e}", path.display())))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ChatStore for FileChatStore {
    async fn save(&self, record: ChatRecord) -> Result<(), StoreError> {
        let path = self.chat_path(&record.id);
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| StoreError::Storage(format!("write {}: {e}", path.display())))?;
        debug!(chat_id = %record.id, path = %path.display(), "Saved chat");
        Ok(())
    }

    async fn load(&self, id: &ChatId) -> Result<Option<ChatRecord>, StoreError> {
        let path = self.chat_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let mut records = Vec::new();
        let entries = std::fs::read_dir(&self.data_dir)
            .map_err(|e| StoreError::Storage(format!("read dir: {e}")))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(record) if record.user_id == user_id => records.push(record),
                Ok(_) => {}
                Err(e) => {
                    // A corrupt file should not hide the rest of the chats
                    warn!(path = %path.display(), error = %e, "Skipping unreadable chat file");
                }
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, id: &ChatId) -> Result<(), StoreError> {
        let path = self.chat_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Storage(format!(
                "delete {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphchat_core::message::{ChatState, Message};

    fn record(user: &str, first_message: &str) -> ChatRecord {
        let mut state = ChatState::new();
        state.push(Message::user(first_message));
        ChatRecord::from_state(&state, user)
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChatStore::new(dir.path()).unwrap();
        let rec = record("user-1", "show me GRT metrics");
        let id = rec.id.clone();

        store.save(rec.clone()).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn load_missing_chat_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChatStore::new(dir.path()).unwrap();
        assert_eq!(store.load(&ChatId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChatStore::new(dir.path()).unwrap();
        store.save(record("user-1", "hello")).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "not json").unwrap();

        let chats = store.list("user-1").await.unwrap();
        assert_eq!(chats.len(), 1);
    }

    #[tokio::test]
    async fn list_orders_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChatStore::new(dir.path()).unwrap();

        let mut older = record("user-1", "first");
        older.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let newer = record("user-1", "second");

        store.save(older).await.unwrap();
        store.save(newer.clone()).await.unwrap();

        let chats = store.list("user-1").await.unwrap();
        assert_eq!(chats[0].id, newer.id);
    }

    #[tokio::test]
    async fn delete_missing_chat_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileChatStore::new(dir.path()).unwrap();
        store.delete(&ChatId::new()).await.unwrap();
    }
}
