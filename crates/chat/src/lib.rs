//! Turn orchestration for GraphChat.
//!
//! This crate wires the domain together: a submitted user message becomes
//! a provider call, tool calls become transcript pairs and rendered
//! views, staged requests become confirmed fetches, and finished
//! transcripts are projected for the client and persisted.

pub mod confirm;
pub mod engine;
pub mod persist;
pub mod projection;
pub mod prompt;

pub use confirm::ConfirmHandles;
pub use engine::{ChatEngine, TurnHandle};
pub use projection::project;
