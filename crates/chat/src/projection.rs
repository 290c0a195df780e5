//! Transcript → renderable view projection.
//!
//! Pure function of the chat state. System annotations and assistant
//! tool-call records are bookkeeping for the model, not UI, so they are
//! skipped; entry ids are derived from the unfiltered message index and
//! stay stable as the transcript grows.

use graphchat_core::message::{ChatState, MessageContent, Role};
use graphchat_core::tool::ToolName;
use graphchat_core::view::{PriceCard, RequestStatus, StagedRequest, View, ViewEntry};
use tracing::warn;

/// Project a transcript into the entries the client renders.
pub fn project(state: &ChatState) -> Vec<ViewEntry> {
    let mut entries: Vec<ViewEntry> = Vec::new();

    for (index, message) in state.messages.iter().enumerate() {
        if message.role == Role::System {
            // The only system messages in a transcript are confirmation
            // annotations; every staged request before one has been run
            for entry in &mut entries {
                if let View::StagedRequest { request } = &mut entry.view {
                    request.status = RequestStatus::Completed;
                }
            }
            continue;
        }

        match &message.content {
            MessageContent::Text(text) => {
                let view = match message.role {
                    Role::User => View::UserText { text: text.clone() },
                    _ => View::AssistantText { text: text.clone() },
                };
                entries.push(ViewEntry {
                    id: format!("{}-{}", state.id, index),
                    view,
                });
            }
            // Call records render nothing; their results do
            MessageContent::ToolUse(_) => {}
            MessageContent::ToolResults(records) => {
                for (offset, record) in records.iter().enumerate() {
                    let Some(view) = result_view(&record.tool_name, &record.result) else {
                        warn!(tool = %record.tool_name, "Skipping unrenderable tool result");
                        continue;
                    };
                    let id = if offset == 0 {
                        format!("{}-{}", state.id, index)
                    } else {
                        format!("{}-{}-{}", state.id, index, offset)
                    };
                    entries.push(ViewEntry { id, view });
                }
            }
        }
    }

    entries
}

fn result_view(tool_name: &str, result: &serde_json::Value) -> Option<View> {
    match ToolName::from_wire(tool_name)? {
        ToolName::VisualiseData => {
            let card: PriceCard = serde_json::from_value(result.clone()).ok()?;
            Some(View::PriceCard { card })
        }
        ToolName::ExecuteRequest => {
            let request: StagedRequest = serde_json::from_value(result.clone()).ok()?;
            Some(View::StagedRequest { request })
        }
    }
}
