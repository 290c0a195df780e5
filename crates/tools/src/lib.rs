//! The chat tool catalog.
//!
//! Two tools exist and the set is closed: `visualise_data` renders a
//! price card, `execute_request` stages a GraphQL request for explicit
//! confirmation. The catalog exposes their wire definitions for the
//! model, an in-flight placeholder view per tool, and the execution
//! itself.

pub mod execute_request;
pub mod visualise_data;

use graphchat_core::tool::{ToolCall, ToolDefinition, ToolOutcome};
use graphchat_core::view::View;
use std::time::Duration;

/// Simulated render latency for card-producing tools.
pub const TOOL_LATENCY: Duration = Duration::from_secs(1);

/// Wire definitions for every tool, in the order the model sees them.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![visualise_data::definition(), execute_request::definition()]
}

/// The placeholder view shown while a tool call is executing.
pub fn placeholder(call: &ToolCall) -> View {
    match call {
        ToolCall::VisualiseData(args) => View::Pending {
            text: format!("Loading price data for {}...", args.symbol),
        },
        ToolCall::ExecuteRequest(_) => View::Pending {
            text: "Preparing request...".into(),
        },
    }
}

/// Execute a validated tool call.
pub async fn run(call: &ToolCall) -> ToolOutcome {
    match call {
        ToolCall::VisualiseData(args) => {
            ToolOutcome::PriceCard(visualise_data::run(args).await)
        }
        ToolCall::ExecuteRequest(args) => {
            ToolOutcome::StagedRequest(execute_request::run(args))
        }
    }
}

/// The final view a tool outcome renders as.
pub fn view(outcome: &ToolOutcome) -> View {
    match outcome {
        ToolOutcome::PriceCard(card) => View::PriceCard { card: card.clone() },
        ToolOutcome::StagedRequest(request) => View::StagedRequest {
            request: request.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphchat_core::tool::{PriceCardArgs, StageRequestArgs};

    #[test]
    fn catalog_has_both_tools() {
        let defs = definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "visualise_data");
        assert_eq!(defs[1].name, "execute_request");
    }

    #[test]
    fn placeholder_names_the_symbol() {
        let call = ToolCall::VisualiseData(PriceCardArgs {
            symbol: "DOGE".into(),
            price: 0.12,
            delta: 0.01,
        });
        match placeholder(&call) {
            View::Pending { text } => assert!(text.contains("DOGE")),
            other => panic!("expected pending view, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_dispatches_by_variant() {
        let call = ToolCall::ExecuteRequest(StageRequestArgs {
            graphql_query: "{ epoches { id } }".into(),
            protocol: "Graph Network".into(),
        });
        let outcome = run(&call).await;
        assert!(matches!(outcome, ToolOutcome::StagedRequest(_)));
        match view(&outcome) {
            View::StagedRequest { request } => {
                assert_eq!(request.protocol, "Graph Network");
            }
            other => panic!("expected staged request view, got {other:?}"),
        }
    }
}
