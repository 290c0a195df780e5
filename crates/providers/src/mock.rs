//! Scripted provider for tests.
//!
//! Downstream crates drive the turn orchestrator against a fixed script
//! of responses instead of a live API. Each `submit` pops the next
//! scripted turn; requests are captured for assertions.

use async_trait::async_trait;
use graphchat_core::error::ProviderError;
use graphchat_core::message::{Message, ToolCallRecord};
use graphchat_core::provider::{
    Provider, ProviderRequest, ProviderResponse, ProviderToolCall, StreamChunk,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted model turn.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// A plain text reply, emitted as a single final chunk
    Text(String),
    /// A text reply streamed as the given fragments
    TextStream(Vec<String>),
    /// A single tool call with raw JSON arguments
    ToolCall { name: String, arguments: String },
    /// A provider failure
    Fail(ProviderError),
}

/// A provider that replays a fixed script.
pub struct MockProvider {
    script: Mutex<VecDeque<ScriptedTurn>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            script: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: a provider that always answers with one text reply.
    pub fn text(reply: impl Into<String>) -> Self {
        Self::new(vec![ScriptedTurn::Text(reply.into())])
    }

    /// The requests seen so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_turn(&self) -> ScriptedTurn {
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| ScriptedTurn::Text("(script exhausted)".into()))
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(request);
        }
        let message = match self.next_turn() {
            ScriptedTurn::Text(text) => Message::assistant(text),
            ScriptedTurn::TextStream(fragments) => Message::assistant(fragments.concat()),
            ScriptedTurn::ToolCall { name, arguments } => Message::tool_use(vec![ToolCallRecord {
                tool_name: name,
                tool_call_id: format!("call_{}", uuid::Uuid::new_v4()),
                args: serde_json::from_str(&arguments).unwrap_or(serde_json::Value::Null),
            }]),
            ScriptedTurn::Fail(err) => return Err(err),
        };
        Ok(ProviderResponse {
            message,
            usage: None,
            model,
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(request);
        }
        let turn = self.next_turn();
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        tokio::spawn(async move {
            match turn {
                ScriptedTurn::Text(text) => {
                    let _ = tx
                        .send(Ok(StreamChunk {
                            content: Some(text),
                            tool_calls: Vec::new(),
                            done: false,
                            usage: None,
                        }))
                        .await;
                    let _ = tx
                        .send(Ok(StreamChunk {
                            content: None,
                            tool_calls: Vec::new(),
                            done: true,
                            usage: None,
                        }))
                        .await;
                }
                ScriptedTurn::TextStream(fragments) => {
                    for fragment in fragments {
                        let _ = tx
                            .send(Ok(StreamChunk {
                                content: Some(fragment),
                                tool_calls: Vec::new(),
                                done: false,
                                usage: None,
                            }))
                            .await;
                    }
                    let _ = tx
                        .send(Ok(StreamChunk {
                            content: None,
                            tool_calls: Vec::new(),
                            done: true,
                            usage: None,
                        }))
                        .await;
                }
                ScriptedTurn::ToolCall { name, arguments } => {
                    let _ = tx
                        .send(Ok(StreamChunk {
                            content: None,
                            tool_calls: vec![ProviderToolCall {
                                id: format!("call_{}", uuid::Uuid::new_v4()),
                                name,
                                arguments,
                            }],
                            done: true,
                            usage: None,
                        }))
                        .await;
                }
                ScriptedTurn::Fail(err) => {
                    let _ = tx.send(Err(err)).await;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "mock-model".into(),
            messages: vec![Message::user("hi")],
            temperature: 0.0,
            max_tokens: None,
            tools: vec![],
            stream: true,
        }
    }

    #[tokio::test]
    async fn scripted_text_streams_then_finishes() {
        let provider = MockProvider::new(vec![ScriptedTurn::TextStream(vec![
            "Hel".into(),
            "lo".into(),
        ])]);
        let mut rx = provider.stream(request()).await.unwrap();
        let mut text = String::new();
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk.unwrap();
            if let Some(content) = chunk.content {
                text.push_str(&content);
            }
            if chunk.done {
                break;
            }
        }
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn scripted_tool_call_arrives_in_final_chunk() {
        let provider = MockProvider::new(vec![ScriptedTurn::ToolCall {
            name: "visualise_data".into(),
            arguments: r#"{"symbol":"DOGE","price":0.12,"delta":0.01}"#.into(),
        }]);
        let mut rx = provider.stream(request()).await.unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.tool_calls[0].name, "visualise_data");
    }

    #[tokio::test]
    async fn captures_requests() {
        let provider = MockProvider::text("ok");
        let _ = provider.complete(request()).await.unwrap();
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_script_still_answers() {
        let provider = MockProvider::new(vec![]);
        let response = provider.complete(request()).await.unwrap();
        assert!(response.message.content.as_text().is_some());
    }
}
