//! In-memory chat store.

use async_trait::async_trait;
use graphchat_core::error::StoreError;
use graphchat_core::message::ChatId;
use graphchat_core::store::{ChatRecord, ChatStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A `ChatStore` backed by a process-local map. Contents are lost on
/// restart; intended for tests and ephemeral deployments.
#[derive(Default)]
pub struct InMemoryChatStore {
    chats: RwLock<HashMap<ChatId, ChatRecord>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn save(&self, record: ChatRecord) -> Result<(), StoreError> {
        self.chats.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn load(&self, id: &ChatId) -> Result<Option<ChatRecord>, StoreError> {
        Ok(self.chats.read().await.get(id).cloned())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let mut records: Vec<ChatRecord> = self
            .chats
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete(&self, id: &ChatId) -> Result<(), StoreError> {
        self.chats.write().await.remove(id);
        Ok(())
    }
}
