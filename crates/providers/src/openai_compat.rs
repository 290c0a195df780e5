//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, and any endpoint that
//! exposes an OpenAI-compatible `/v1/chat/completions` route.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Tool use / function calling

use async_trait::async_trait;
use futures::StreamExt;
use graphchat_core::error::ProviderError;
use graphchat_core::message::{Message, MessageContent, Role, ToolCallRecord};
use graphchat_core::provider::{
    Provider, ProviderRequest, ProviderResponse, ProviderToolCall, StreamChunk, Usage,
};
use graphchat_core::tool::ToolDefinition;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Convert transcript messages to OpenAI API format.
    ///
    /// Tool-result messages fan out: the API wants one `tool` message per
    /// tool_call_id, while the transcript batches results per turn.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .flat_map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                    Role::Tool => "tool",
                };
                match &m.content {
                    MessageContent::Text(text) => vec![ApiMessage {
                        role: role.into(),
                        content: Some(text.clone()),
                        name: m.name.clone(),
                        tool_calls: None,
                        tool_call_id: None,
                    }],
                    MessageContent::ToolUse(records) => vec![ApiMessage {
                        role: role.into(),
                        content: None,
                        name: m.name.clone(),
                        tool_calls: Some(
                            records
                                .iter()
                                .map(|r| ApiToolCall {
                                    id: r.tool_call_id.clone(),
                                    r#type: "function".into(),
                                    function: ApiFunction {
                                        name: r.tool_name.clone(),
                                        arguments: r.args.to_string(),
                                    },
                                })
                                .collect(),
                        ),
                        tool_call_id: None,
                    }],
                    // The message-level name rides along on every fanned-out
                    // tool message
                    MessageContent::ToolResults(records) => records
                        .iter()
                        .map(|r| ApiMessage {
                            role: "tool".into(),
                            content: Some(r.result.to_string()),
                            name: m.name.clone(),
                            tool_calls: None,
                            tool_call_id: Some(r.tool_call_id.clone()),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// Convert tool definitions to OpenAI API format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": stream,
        });

        if stream {
            body["stream_options"] = serde_json::json!({ "include_usage": true });
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    fn check_status(status: u16, error_body: String) -> Result<(), ProviderError> {
        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request, false);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            Self::check_status(status, error_body)?;
            unreachable!("check_status always errors for non-200 status");
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice =
            api_response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::ApiError {
                    status_code: 200,
                    message: "No choices in response".into(),
                })?;

        let message = match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => Message::tool_use(
                calls
                    .into_iter()
                    .map(|tc| ToolCallRecord {
                        tool_name: tc.function.name,
                        tool_call_id: tc.id,
                        args: serde_json::from_str(&tc.function.arguments)
                            .unwrap_or(serde_json::Value::Null),
                    })
                    .collect(),
            ),
            _ => Message::assistant(choice.message.content.unwrap_or_default()),
        };

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message,
            usage,
            model: api_response.model,
        })
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request, true);

        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            Self::check_status(status, error_body)?;
            unreachable!("check_status always errors for non-200 status");
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        // Read the SSE byte stream and parse chunks on a detached task
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            // Accumulators for tool call deltas (keyed by index)
            let mut tool_call_accumulators: std::collections::HashMap<u32, ToolCallAccumulator> =
                std::collections::HashMap::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    // Skip empty lines and SSE comments
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    if let Some(data) = line.strip_prefix("data: ") {
                        let data = data.trim();

                        // "[DONE]" signals end of stream
                        if data == "[DONE]" {
                            let final_tool_calls: Vec<ProviderToolCall> = tool_call_accumulators
                                .values()
                                .map(|acc| acc.to_tool_call())
                                .collect();

                            let _ = tx
                                .send(Ok(StreamChunk {
                                    content: None,
                                    tool_calls: final_tool_calls,
                                    done: true,
                                    usage: None,
                                }))
                                .await;
                            return;
                        }

                        match serde_json::from_str::<StreamResponse>(data) {
                            Ok(stream_resp) => {
                                if let Some(choice) = stream_resp.choices.first() {
                                    let delta = &choice.delta;

                                    // Accumulate tool call deltas
                                    if let Some(ref tc_deltas) = delta.tool_calls {
                                        for tc_delta in tc_deltas {
                                            let acc = tool_call_accumulators
                                                .entry(tc_delta.index)
                                                .or_insert_with(ToolCallAccumulator::default);

                                            if let Some(ref id) = tc_delta.id {
                                                acc.id = id.clone();
                                            }
                                            if let Some(ref func) = tc_delta.function {
                                                if let Some(ref name) = func.name {
                                                    acc.name = name.clone();
                                                }
                                                if let Some(ref args) = func.arguments {
                                                    acc.arguments.push_str(args);
                                                }
                                            }
                                        }
                                    }

                                    let has_content =
                                        delta.content.as_ref().is_some_and(|c| !c.is_empty());

                                    if has_content {
                                        let chunk = StreamChunk {
                                            content: delta.content.clone(),
                                            tool_calls: Vec::new(),
                                            done: false,
                                            usage: None,
                                        };

                                        if tx.send(Ok(chunk)).await.is_err() {
                                            return; // receiver dropped
                                        }
                                    }
                                }

                                // Usage arrives in the final chunk (stream_options)
                                if let Some(usage) = stream_resp.usage {
                                    let final_tool_calls: Vec<ProviderToolCall> =
                                        tool_call_accumulators
                                            .values()
                                            .map(|acc| acc.to_tool_call())
                                            .collect();

                                    let chunk = StreamChunk {
                                        content: None,
                                        tool_calls: final_tool_calls,
                                        done: true,
                                        usage: Some(Usage {
                                            prompt_tokens: usage.prompt_tokens,
                                            completion_tokens: usage.completion_tokens,
                                            total_tokens: usage.total_tokens,
                                        }),
                                    };

                                    let _ = tx.send(Ok(chunk)).await;
                                    return;
                                }
                            }
                            Err(e) => {
                                trace!(
                                    provider = %provider_name,
                                    data = %data,
                                    error = %e,
                                    "Ignoring unparseable SSE chunk"
                                );
                            }
                        }
                    }
                }
            }

            // Stream ended without [DONE] — send final chunk
            let final_tool_calls: Vec<ProviderToolCall> = tool_call_accumulators
                .values()
                .map(|acc| acc.to_tool_call())
                .collect();

            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    tool_calls: final_tool_calls,
                    done: true,
                    usage: None,
                }))
                .await;
        });

        Ok(rx)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<StreamToolCallDelta>>,
}

/// A tool call delta — arrives incrementally across chunks.
#[derive(Debug, Deserialize)]
struct StreamToolCallDelta {
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<StreamFunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Accumulates incremental tool call deltas into a complete tool call.
#[derive(Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallAccumulator {
    fn to_tool_call(&self) -> ProviderToolCall {
        ProviderToolCall {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments: self.arguments.clone(),
        }
    }
}
