//! # GraphChat Core
//!
//! Domain types, traits, and error definitions for the GraphChat
//! conversational subgraph-analytics service. This crate has **zero
//! framework dependencies** — it defines the domain model that all other
//! crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (LLM provider, transcript store, session
//! source) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod provider;
pub mod session;
pub mod store;
pub mod stream;
pub mod tool;
pub mod view;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{ChatHandle, ChatId, ChatState, Message, MessageContent, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ProviderToolCall, StreamChunk};
pub use session::{Session, SessionProvider};
pub use store::{ChatRecord, ChatStore};
pub use stream::{Progress, StreamHandle, StreamWriter};
pub use tool::{ToolCall, ToolDefinition, ToolName, ToolOutcome};
pub use view::{PriceCard, RequestStatus, StagedRequest, View, ViewEntry};
