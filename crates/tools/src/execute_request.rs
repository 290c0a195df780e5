//! The `execute_request` tool: stage a GraphQL request for confirmation.
//!
//! Staging never touches the network. The request is recorded with
//! `requires_action` status and the user must confirm it through the
//! separate confirmation step before anything is fetched.

use graphchat_core::tool::{StageRequestArgs, ToolDefinition};
use graphchat_core::view::{RequestStatus, StagedRequest};
use tracing::debug;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "execute_request".into(),
        description:
            "Show the UI to execute a GraphQL request. Use this if the user wants to call the graph."
                .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "graphql_query": {
                    "type": "string",
                    "description": "GraphQL query that will be executed"
                },
                "protocol": {
                    "type": "string",
                    "description": "The protocol thats being called."
                }
            },
            "required": ["graphql_query", "protocol"]
        }),
    }
}

pub fn run(args: &StageRequestArgs) -> StagedRequest {
    debug!(protocol = %args.protocol, "Staging GraphQL request");
    StagedRequest {
        graphql_query: args.graphql_query.clone(),
        protocol: args.protocol.clone(),
        status: RequestStatus::RequiresAction,
    }
}
