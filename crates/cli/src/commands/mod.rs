//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod chats;
pub mod gateway;

use std::sync::Arc;

use graphchat_chat::ChatEngine;
use graphchat_config::AppConfig;
use graphchat_core::provider::Provider;
use graphchat_core::session::SessionProvider;
use graphchat_core::store::ChatStore;
use graphchat_core::view::{RequestStatus, View};
use graphchat_providers::OpenAiCompatProvider;
use graphchat_storage::{
    AnonymousSessionProvider, FileChatStore, InMemoryChatStore, StaticSessionProvider,
};
use graphchat_subgraph::SubgraphClient;

/// Load config and fail with setup instructions when no API key is set.
pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if config.api_key.is_none() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GRAPHCHAT_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// Wire up a chat engine from config: provider, store, sessions, subgraph.
pub(crate) fn build_engine(config: &AppConfig) -> Result<ChatEngine, Box<dyn std::error::Error>> {
    let api_key = config.api_key.clone().ok_or("No API key configured")?;
    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.api_base.clone(),
        api_key,
    )?);

    let store: Arc<dyn ChatStore> = match config.storage.backend.as_str() {
        "memory" => Arc::new(InMemoryChatStore::new()),
        _ => Arc::new(FileChatStore::new(config.storage.data_dir.clone())?),
    };

    let sessions: Arc<dyn SessionProvider> = match &config.storage.user_id {
        Some(user_id) => Arc::new(StaticSessionProvider::new(user_id.clone())),
        None => Arc::new(AnonymousSessionProvider),
    };

    let subgraph = Arc::new(SubgraphClient::new(
        config.graph.clone(),
        config.fetch.timeout_secs,
    )?);

    Ok(ChatEngine::new(provider, store, sessions, subgraph, config))
}

/// Render a view as terminal output.
pub(crate) fn render(view: &View) -> String {
    match view {
        View::UserText { text } | View::AssistantText { text } | View::SystemNote { text } => {
            text.clone()
        }
        View::Pending { text } => format!("... {text}"),
        View::PriceCard { card } => {
            format!("{}: {} ({:+})", card.symbol, card.price, card.delta)
        }
        View::StagedRequest { request } => {
            let status = match request.status {
                RequestStatus::RequiresAction => "(awaiting confirmation)",
                RequestStatus::Completed => "(completed)",
            };
            format!(
                "Staged GraphQL request for {}:\n{}\n{status}",
                request.protocol, request.graphql_query
            )
        }
        View::Error { message } => format!("[Error] {message}"),
    }
}
