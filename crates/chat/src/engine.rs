//! The turn orchestrator.
//!
//! `submit_user_message` appends the user message, spawns the turn task,
//! and immediately hands back a `TurnHandle` whose view stream the caller
//! renders. One model invocation per turn: the model either streams text
//! or selects exactly one tool, never both chained.

use std::sync::Arc;

use graphchat_config::AppConfig;
use graphchat_core::error::{Error, Result};
use graphchat_core::message::{
    ChatHandle, ChatId, Message, ToolCallRecord, ToolResultRecord,
};
use graphchat_core::provider::{Provider, ProviderRequest};
use graphchat_core::session::SessionProvider;
use graphchat_core::store::ChatStore;
use graphchat_core::stream::{self, StreamHandle, StreamWriter};
use graphchat_core::tool::ToolCall;
use graphchat_core::view::View;
use graphchat_subgraph::SubgraphClient;
use tracing::{debug, warn};

use crate::{persist, prompt};

/// A running turn: the chat it belongs to and its live view stream.
pub struct TurnHandle {
    pub chat_id: ChatId,
    pub view: StreamHandle<View>,
}

/// Orchestrates chat turns against a provider, tool catalog, and store.
#[derive(Clone)]
pub struct ChatEngine {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) store: Arc<dyn ChatStore>,
    pub(crate) sessions: Arc<dyn SessionProvider>,
    pub(crate) subgraph: Arc<SubgraphClient>,
    pub(crate) model: String,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) system_prompt: String,
    pub(crate) report_failures: bool,
    pub(crate) confirm_delay: std::time::Duration,
}

impl ChatEngine {
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ChatStore>,
        sessions: Arc<dyn SessionProvider>,
        subgraph: Arc<SubgraphClient>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            store,
            sessions,
            subgraph,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            system_prompt: prompt::render(None, None),
            report_failures: config.fetch.report_failures,
            confirm_delay: std::time::Duration::from_millis(config.fetch.delay_ms),
        }
    }

    /// Replace the system prompt, e.g. to embed protocol context and schema.
    pub fn with_system_prompt(mut self, system_prompt: String) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    /// Submit a user message and start a turn.
    ///
    /// The user message is appended before this returns; everything else
    /// happens on a spawned task and surfaces through the handle. Errors
    /// after the spawn finalize the handle with `View::Error` instead of
    /// failing the call.
    pub async fn submit_user_message(
        &self,
        chat: &ChatHandle,
        text: impl Into<String>,
    ) -> Result<TurnHandle> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("empty message".into()));
        }

        chat.append(Message::user(text)).await;

        let (writer, handle) = stream::channel::<View>();
        let chat_id = chat.id().clone();
        let engine = self.clone();
        let chat = chat.clone();

        tokio::spawn(async move {
            engine.run_turn(chat, writer).await;
        });

        Ok(TurnHandle {
            chat_id,
            view: handle,
        })
    }

    async fn run_turn(&self, chat: ChatHandle, writer: StreamWriter<View>) {
        let snapshot = chat.snapshot().await;

        let mut messages = Vec::with_capacity(snapshot.messages.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(snapshot.messages);

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: graphchat_tools::definitions(),
            stream: true,
        };

        let mut rx = match self.provider.stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(chat_id = %chat.id(), error = %e, "Provider stream failed to start");
                writer.done(View::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        let mut text = String::new();

        while let Some(chunk) = rx.recv().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    warn!(chat_id = %chat.id(), error = %e, "Provider stream interrupted");
                    writer.done(View::Error {
                        message: e.to_string(),
                    });
                    return;
                }
            };

            if let Some(delta) = chunk.content {
                text.push_str(&delta);
                writer.update(View::AssistantText { text: text.clone() });
            }

            if chunk.done {
                if let Some(call) = chunk.tool_calls.first() {
                    self.finish_tool_turn(&chat, &writer, &call.name, &call.arguments, &call.id)
                        .await;
                } else {
                    self.finish_text_turn(&chat, &writer, text).await;
                }
                return;
            }
        }

        // Stream ended without a final chunk; commit what we have
        self.finish_text_turn(&chat, &writer, text).await;
    }

    async fn finish_text_turn(&self, chat: &ChatHandle, writer: &StreamWriter<View>, text: String) {
        if !text.is_empty() {
            chat.append(Message::assistant(text.clone())).await;
        }
        self.persist(chat).await;
        writer.done(View::AssistantText { text });
    }

    async fn finish_tool_turn(
        &self,
        chat: &ChatHandle,
        writer: &StreamWriter<View>,
        name: &str,
        raw_args: &str,
        call_id: &str,
    ) {
        let args: serde_json::Value =
            serde_json::from_str(raw_args).unwrap_or(serde_json::Value::Null);

        let call = match ToolCall::parse(name, &args) {
            Ok(call) => call,
            Err(e) => {
                warn!(chat_id = %chat.id(), tool = name, error = %e, "Rejected tool call");
                writer.done(View::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        writer.update(graphchat_tools::placeholder(&call));

        let outcome = graphchat_tools::run(&call).await;

        let tool_call_id = if call_id.is_empty() {
            format!("call_{}", uuid::Uuid::new_v4())
        } else {
            call_id.to_string()
        };
        let wire_name = call.name().wire_name();

        // The call record and its result land in one lock scope
        chat.append_all(vec![
            Message::tool_use(vec![ToolCallRecord {
                tool_name: wire_name.into(),
                tool_call_id: tool_call_id.clone(),
                args: call.args_json(),
            }]),
            Message::tool_results(
                wire_name,
                vec![ToolResultRecord {
                    tool_name: wire_name.into(),
                    tool_call_id,
                    result: outcome.result_json(),
                }],
            ),
        ])
        .await;

        debug!(chat_id = %chat.id(), tool = wire_name, "Tool turn committed");

        self.persist(chat).await;
        writer.done(graphchat_tools::view(&outcome));
    }

    /// Whether the configured provider currently reports itself healthy.
    pub async fn provider_healthy(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }

    /// Rebuild a live handle for a stored chat, if the session can see it.
    pub async fn restore_chat(&self, id: &ChatId) -> Result<Option<ChatHandle>> {
        let state = persist::restore(id, self.store.as_ref(), self.sessions.as_ref()).await?;
        Ok(state.map(ChatHandle::new))
    }

    /// The current session's chats, most recent first. Empty when
    /// unauthenticated.
    pub async fn list_chats(&self) -> Result<Vec<graphchat_core::store::ChatRecord>> {
        match self.sessions.current().await {
            Some(session) => Ok(self.store.list(&session.user_id).await?),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) async fn persist(&self, chat: &ChatHandle) {
        if let Err(e) =
            persist::save_transcript(chat, self.store.as_ref(), self.sessions.as_ref()).await
        {
            warn!(chat_id = %chat.id(), error = %e, "Failed to persist chat");
        }
    }
}
