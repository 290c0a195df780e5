//! Renderable view entries.
//!
//! A `View` is what the front-end actually draws for one transcript entry
//! or one in-flight placeholder. Views are plain serializable data — the
//! gateway ships them to the client as JSON and the CLI pretty-prints them.

use serde::{Deserialize, Serialize};

/// A price/delta card, the result of the `visualise_data` tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCard {
    pub symbol: String,
    pub price: f64,
    pub delta: f64,
}

/// Lifecycle status of a staged GraphQL request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Staged and waiting for the user's explicit confirmation
    RequiresAction,
    /// The confirmation step has run the request
    Completed,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::RequiresAction
    }
}

/// A GraphQL request staged by the `execute_request` tool for a second,
/// explicit confirmation step. Staging never fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRequest {
    pub graphql_query: String,
    pub protocol: String,
    /// Absent in older transcripts; staged is the safe reading
    #[serde(default)]
    pub status: RequestStatus,
}

/// One renderable chat element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    /// Plain user text
    UserText { text: String },
    /// Plain assistant text (possibly still accumulating)
    AssistantText { text: String },
    /// In-flight placeholder with a short status line
    Pending { text: String },
    /// Price card produced by `visualise_data`
    PriceCard { card: PriceCard },
    /// Staged request produced by `execute_request`
    StagedRequest { request: StagedRequest },
    /// Out-of-band note from the confirmation step
    SystemNote { text: String },
    /// Terminal error surface for a failed turn
    Error { message: String },
}

/// A projected transcript entry: stable id plus its renderable view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewEntry {
    pub id: String,
    pub view: View,
}
