//! Chat transcript persistence backends.
//!
//! Two `ChatStore` implementations: an in-memory map for tests and
//! single-process use, and a file-per-chat JSON store for durability.
//! Session providers for gating persistence live here too.

pub mod file_store;
pub mod in_memory;
pub mod sessions;

pub use file_store::FileChatStore;
pub use in_memory::InMemoryChatStore;
pub use sessions::{AnonymousSessionProvider, StaticSessionProvider};
