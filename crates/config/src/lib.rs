//! Configuration loading, validation, and management for GraphChat.
//!
//! Loads configuration from `~/.graphchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.graphchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model to use for turn orchestration
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Subgraph endpoint mapping
    #[serde(default)]
    pub graph: GraphConfig,

    /// Confirmed-fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Transcript storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("graph", &self.graph)
            .field("fetch", &self.fetch)
            .field("gateway", &self.gateway)
            .field("storage", &self.storage)
            .finish()
    }
}

/// Mapping from protocol names the model uses to subgraph deployment ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL of the graph gateway; the deployment id is appended
    #[serde(default = "default_endpoint_base")]
    pub endpoint_base: String,

    /// Protocol name → subgraph deployment id
    #[serde(default = "default_protocols")]
    pub protocols: HashMap<String, String>,

    /// Deployment id used when the protocol name is not in the table
    #[serde(default = "default_subgraph")]
    pub default_subgraph: String,
}

fn default_endpoint_base() -> String {
    "https://gateway.thegraph.com/api/subgraphs/id".into()
}
fn default_protocols() -> HashMap<String, String> {
    HashMap::from([(
        "Graph Network".to_string(),
        "DZz4kDTdmzWLWsV373w2bSmoar3umKKH9y82SUKr5qmp".to_string(),
    )])
}
fn default_subgraph() -> String {
    "5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV".into()
}

impl GraphConfig {
    /// The full query endpoint for a protocol name. Unknown protocols
    /// fall back to the default subgraph.
    pub fn endpoint_for(&self, protocol: &str) -> String {
        let deployment = self
            .protocols
            .get(protocol)
            .unwrap_or(&self.default_subgraph);
        format!("{}/{}", self.endpoint_base.trim_end_matches('/'), deployment)
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint_base: default_endpoint_base(),
            protocols: default_protocols(),
            default_subgraph: default_subgraph(),
        }
    }
}

/// How the confirmation step reports fetch failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// When false, a failed fetch is annotated as a null result with
    /// success framing. When true, the annotation names the failure.
    #[serde(default)]
    pub report_failures: bool,

    /// Pacing delay before a confirmed fetch runs, in milliseconds
    #[serde(default = "default_fetch_delay_ms")]
    pub delay_ms: u64,

    /// Request timeout for subgraph fetches, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

fn default_fetch_delay_ms() -> u64 {
    1000
}

fn default_fetch_timeout() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            report_failures: false,
            delay_ms: default_fetch_delay_ms(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Permissive CORS for browser clients
    #[serde(default = "default_true")]
    pub cors: bool,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "memory" or "file"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Directory for the file backend
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// User id reported by the static session provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn default_storage_backend() -> String {
    "file".into()
}
fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("chats")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            data_dir: default_data_dir(),
            user_id: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.graphchat/config.toml).
    ///
    /// Also checks environment variables:
    /// - `GRAPHCHAT_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `GRAPHCHAT_MODEL` overrides the model
    /// - `GRAPH_ENDPOINT` overrides the graph gateway base URL
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("GRAPHCHAT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("GRAPHCHAT_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("GRAPH_ENDPOINT") {
            config.graph.endpoint_base = endpoint;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".graphchat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.graph.endpoint_base.is_empty() {
            return Err(ConfigError::ValidationError(
                "graph.endpoint_base must not be empty".into(),
            ));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The full query endpoint for a protocol name.
    pub fn subgraph_endpoint(&self, protocol: &str) -> String {
        self.graph.endpoint_for(protocol)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            graph: GraphConfig::default(),
            fetch: FetchConfig::default(),
            gateway: GatewayConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.gateway.port, 8080);
        assert!(!config.fetch.report_failures);
        assert_eq!(config.fetch.delay_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.graph.default_subgraph, config.graph.default_subgraph);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn known_protocol_maps_to_its_deployment() {
        let config = AppConfig::default();
        assert_eq!(
            config.subgraph_endpoint("Graph Network"),
            "https://gateway.thegraph.com/api/subgraphs/id/DZz4kDTdmzWLWsV373w2bSmoar3umKKH9y82SUKr5qmp"
        );
    }

    #[test]
    fn unknown_protocol_falls_back_to_default_subgraph() {
        let config = AppConfig::default();
        assert_eq!(
            config.subgraph_endpoint("Uniswap V3"),
            "https://gateway.thegraph.com/api/subgraphs/id/5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV"
        );
    }

    #[test]
    fn protocol_table_parses_from_toml() {
        let toml_str = r#"
[graph]
endpoint_base = "http://localhost:9000/id"

[graph.protocols]
"Graph Network" = "deploy-a"
"Uniswap V3" = "deploy-b"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.subgraph_endpoint("Uniswap V3"),
            "http://localhost:9000/id/deploy-b"
        );
    }

    #[test]
    fn config_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gpt-4o"
temperature = 0.2

[fetch]
report_failures = true

[gateway]
port = 3000
"#,
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert!(config.fetch.report_failures);
        assert_eq!(config.gateway.port, 3000);
        // untouched sections keep defaults
        assert_eq!(config.storage.backend, "file");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
