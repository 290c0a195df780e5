//! Message and chat transcript domain types.
//!
//! These are the core value objects that flow through the whole system:
//! the user submits text → the orchestrator appends it to the transcript →
//! the provider generates a response or selects a tool → the resulting
//! entries are appended and projected into view entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for a chat (conversation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// Synthetic annotations (e.g. "data was fetched"), never projected
    System,
    /// Tool execution results
    Tool,
}

/// A tool-call entry inside an `assistant` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub tool_call_id: String,
    pub args: serde_json::Value,
}

/// A tool-result entry inside a `tool` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultRecord {
    pub tool_name: String,
    pub tool_call_id: String,
    pub result: serde_json::Value,
}

/// The content of a message: plain text, or an ordered sequence of
/// tool-invocation records.
///
/// Untagged on the wire so plain-text messages serialize as a bare string,
/// matching the transcript format the web client persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    ToolUse(Vec<ToolCallRecord>),
    ToolResults(Vec<ToolResultRecord>),
}

impl MessageContent {
    /// The plain text, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A single message in a chat transcript.
///
/// Once appended, `id` and `role` never change; the transcript itself is
/// append-only and reflects conversation chronology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// Text or tool-invocation records
    pub content: MessageContent,

    /// Present when the content originates from a specific tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            name: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text(content.into()))
    }

    /// Create a new assistant text message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text(content.into()))
    }

    /// Create a new system annotation.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, MessageContent::Text(content.into()))
    }

    /// Create an assistant message carrying tool-call records.
    pub fn tool_use(records: Vec<ToolCallRecord>) -> Self {
        Self::new(Role::Assistant, MessageContent::ToolUse(records))
    }

    /// Create a tool message carrying tool-result records.
    pub fn tool_results(name: impl Into<String>, records: Vec<ToolResultRecord>) -> Self {
        let mut msg = Self::new(Role::Tool, MessageContent::ToolResults(records));
        msg.name = Some(name.into());
        msg
    }
}

/// The full state of one chat: an ordered, append-only transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub id: ChatId,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

impl ChatState {
    /// Create a new empty chat with a fresh id.
    pub fn new() -> Self {
        Self {
            id: ChatId::new(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a message to the transcript.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The text of the first user message, if any.
    pub fn first_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.as_text())
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, explicitly-passed handle to one chat's state.
///
/// This replaces the ambient per-request AI context of the original web
/// implementation: every orchestrator call receives the handle it should
/// mutate. One active turn per chat is the intended usage; interleaved
/// writers are serialized by the lock but their ordering is unspecified.
#[derive(Clone)]
pub struct ChatHandle {
    inner: Arc<RwLock<ChatState>>,
    id: ChatId,
}

impl ChatHandle {
    pub fn new(state: ChatState) -> Self {
        let id = state.id.clone();
        Self {
            inner: Arc::new(RwLock::new(state)),
            id,
        }
    }

    /// The chat id (stable for the lifetime of the handle).
    pub fn id(&self) -> &ChatId {
        &self.id
    }

    /// Append a single message.
    pub async fn append(&self, message: Message) {
        self.inner.write().await.push(message);
    }

    /// Append several messages in one lock scope, so related entries
    /// (e.g. a tool-call record and its result) land atomically.
    pub async fn append_all(&self, messages: Vec<Message>) {
        let mut state = self.inner.write().await;
        for message in messages {
            state.push(message);
        }
    }

    /// Clone the current state.
    pub async fn snapshot(&self) -> ChatState {
        self.inner.read().await.clone()
    }
}

impl Default for ChatHandle {
    fn default() -> Self {
        Self::new(ChatState::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("show me GRT supply");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content.as_text(), Some("show me GRT supply"));
    }

    #[test]
    fn text_content_serializes_as_bare_string() {
        let msg = Message::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"], serde_json::json!("hello"));
    }

    #[test]
    fn tool_records_roundtrip_with_camel_case_fields() {
        let msg = Message::tool_use(vec![ToolCallRecord {
            tool_name: "visualise_data".into(),
            tool_call_id: "call_1".into(),
            args: serde_json::json!({"symbol": "GRT"}),
        }]);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""toolName":"visualise_data""#));
        assert!(json.contains(r#""toolCallId":"call_1""#));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, msg.content);
    }

    #[test]
    fn tool_results_deserialize_to_result_variant() {
        let json = r#"{
            "id": "m1",
            "role": "tool",
            "content": [{"toolName": "visualise_data", "toolCallId": "c1", "result": {"price": 0.12}}],
            "timestamp": "2024-01-01T00:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        match msg.content {
            MessageContent::ToolResults(records) => {
                assert_eq!(records[0].result["price"], 0.12);
            }
            other => panic!("expected tool results, got {other:?}"),
        }
    }

    #[test]
    fn first_user_text_skips_system_entries() {
        let mut state = ChatState::new();
        state.push(Message::system("[Resulting GraphQL Request: null]"));
        state.push(Message::user("what is the current epoch?"));
        assert_eq!(state.first_user_text(), Some("what is the current epoch?"));
    }

    #[tokio::test]
    async fn handle_append_all_is_one_lock_scope() {
        let handle = ChatHandle::default();
        handle
            .append_all(vec![Message::user("a"), Message::assistant("b")])
            .await;
        let state = handle.snapshot().await;
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::User);
        assert_eq!(state.messages[1].role, Role::Assistant);
    }
}
