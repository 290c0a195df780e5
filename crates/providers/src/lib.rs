//! LLM provider implementations for GraphChat.
//!
//! The turn orchestrator talks to the `Provider` trait from
//! `graphchat-core`; this crate supplies the real OpenAI-compatible
//! backend and a scripted mock for tests.

pub mod mock;
pub mod openai_compat;

pub use mock::MockProvider;
pub use openai_compat::OpenAiCompatProvider;
