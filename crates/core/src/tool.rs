//! The closed tool set the model may invoke.
//!
//! Tools are a fixed sum type rather than a string-keyed registry: the
//! model addresses them by wire name, `ToolCall::parse` validates the raw
//! arguments into typed payloads, and everything downstream dispatches by
//! exhaustive matching.

use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::view::{PriceCard, StagedRequest};

/// The known tool identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Render a price/delta card for a symbol
    VisualiseData,
    /// Stage a GraphQL request for explicit confirmation
    ExecuteRequest,
}

impl ToolName {
    /// The name the model uses to address this tool.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::VisualiseData => "visualise_data",
            Self::ExecuteRequest => "execute_request",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "visualise_data" => Some(Self::VisualiseData),
            "execute_request" => Some(Self::ExecuteRequest),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Arguments for `visualise_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceCardArgs {
    /// The name or symbol of the asset, e.g. GRT/DOGE/USD
    pub symbol: String,
    pub price: f64,
    pub delta: f64,
}

/// Arguments for `execute_request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageRequestArgs {
    /// The GraphQL query that will be executed on confirmation
    pub graphql_query: String,
    /// The protocol (subgraph data source) being called
    pub protocol: String,
}

/// A validated, typed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    VisualiseData(PriceCardArgs),
    ExecuteRequest(StageRequestArgs),
}

impl ToolCall {
    /// Validate a raw `{name, args}` pair from the model into a typed call.
    ///
    /// This is the only path from model output into tool execution; serde
    /// with `deny_unknown_fields` is the argument schema enforcement.
    pub fn parse(name: &str, args: &serde_json::Value) -> Result<Self, ToolError> {
        let tool = ToolName::from_wire(name).ok_or_else(|| ToolError::UnknownTool(name.into()))?;
        let invalid = |e: serde_json::Error| ToolError::InvalidArguments {
            tool_name: tool.wire_name().into(),
            reason: e.to_string(),
        };
        match tool {
            ToolName::VisualiseData => Ok(Self::VisualiseData(
                serde_json::from_value(args.clone()).map_err(invalid)?,
            )),
            ToolName::ExecuteRequest => Ok(Self::ExecuteRequest(
                serde_json::from_value(args.clone()).map_err(invalid)?,
            )),
        }
    }

    pub fn name(&self) -> ToolName {
        match self {
            Self::VisualiseData(_) => ToolName::VisualiseData,
            Self::ExecuteRequest(_) => ToolName::ExecuteRequest,
        }
    }

    /// The argument payload as it appears in transcript call records.
    pub fn args_json(&self) -> serde_json::Value {
        match self {
            Self::VisualiseData(args) => serde_json::json!({
                "symbol": args.symbol,
                "price": args.price,
                "delta": args.delta,
            }),
            Self::ExecuteRequest(args) => serde_json::json!({
                "graphql_query": args.graphql_query,
                "protocol": args.protocol,
            }),
        }
    }
}

/// The structured result a tool execution produces.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    PriceCard(PriceCard),
    StagedRequest(StagedRequest),
}

impl ToolOutcome {
    pub fn tool_name(&self) -> ToolName {
        match self {
            Self::PriceCard(_) => ToolName::VisualiseData,
            Self::StagedRequest(_) => ToolName::ExecuteRequest,
        }
    }

    /// The result payload as it appears in transcript result records.
    pub fn result_json(&self) -> serde_json::Value {
        match self {
            Self::PriceCard(card) => serde_json::json!({
                "symbol": card.symbol,
                "price": card.price,
                "delta": card.delta,
            }),
            Self::StagedRequest(request) => serde_json::json!({
                "graphql_query": request.graphql_query,
                "protocol": request.protocol,
                "status": request.status,
            }),
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}
