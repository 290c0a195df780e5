//! GraphQL subgraph proxy client.
//!
//! Forwards a raw GraphQL query to the graph gateway endpoint mapped for
//! a protocol name and returns the response body verbatim. The caller
//! never sees transport errors: any failure collapses to `None`, which
//! the confirmation step annotates per its configured policy.

use graphchat_config::GraphConfig;
use tracing::{debug, warn};

/// Client for the subgraph query gateway.
pub struct SubgraphClient {
    graph: GraphConfig,
    client: reqwest::Client,
}

impl SubgraphClient {
    /// Build a client. Fails only if the HTTP client cannot be constructed.
    pub fn new(graph: GraphConfig, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { graph, client })
    }

    /// The endpoint a protocol name resolves to.
    pub fn resolve_endpoint(&self, protocol: &str) -> String {
        let endpoint = self.graph.endpoint_for(protocol);
        if !self.graph.protocols.contains_key(protocol) {
            warn!(protocol, "Unknown protocol, using default subgraph");
        }
        endpoint
    }

    /// Execute a GraphQL query against the protocol's subgraph.
    ///
    /// Returns the response body verbatim on HTTP 200; `None` on any
    /// transport error, non-200 status, or unparseable body.
    pub async fn fetch(&self, protocol: &str, query: &str) -> Option<serde_json::Value> {
        let endpoint = self.resolve_endpoint(protocol);
        debug!(protocol, endpoint = %endpoint, "Forwarding GraphQL query");

        let response = match self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(protocol, error = %e, "Subgraph request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                protocol,
                status = response.status().as_u16(),
                "Subgraph returned non-success status"
            );
            return None;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(protocol, error = %e, "Subgraph response was not valid JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn graph_config(base: &str) -> GraphConfig {
        GraphConfig {
            endpoint_base: base.to_string(),
            protocols: HashMap::from([("Graph Network".to_string(), "deploy-a".to_string())]),
            default_subgraph: "deploy-default".to_string(),
        }
    }

    #[test]
    fn known_protocol_resolves_to_mapped_deployment() {
        let client = SubgraphClient::new(graph_config("http://example.com/id"), 5).unwrap();
        assert_eq!(
            client.resolve_endpoint("Graph Network"),
            "http://example.com/id/deploy-a"
        );
    }

    #[test]
    fn unknown_protocol_resolves_to_default() {
        let client = SubgraphClient::new(graph_config("http://example.com/id"), 5).unwrap();
        assert_eq!(
            client.resolve_endpoint("Aave V3"),
            "http://example.com/id/deploy-default"
        );
    }

    #[tokio::test]
    async fn fetch_returns_body_verbatim_on_success() {
        let router = Router::new().route(
            "/deploy-a",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["query"], "{ graphNetworks { totalSupply } }");
                Json(serde_json::json!({"data": {"graphNetworks": [{"totalSupply": "10"}]}}))
            }),
        );
        let base = spawn_server(router).await;

        let client = SubgraphClient::new(graph_config(&base), 5).unwrap();
        let result = client
            .fetch("Graph Network", "{ graphNetworks { totalSupply } }")
            .await;
        assert_eq!(
            result,
            Some(serde_json::json!({"data": {"graphNetworks": [{"totalSupply": "10"}]}}))
        );
    }

    #[tokio::test]
    async fn fetch_returns_none_on_server_error() {
        let router = Router::new().route(
            "/deploy-a",
            post(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_server(router).await;

        let client = SubgraphClient::new(graph_config(&base), 5).unwrap();
        assert_eq!(client.fetch("Graph Network", "{ epoches { id } }").await, None);
    }

    #[tokio::test]
    async fn fetch_returns_none_when_endpoint_unreachable() {
        // Reserved port with nothing listening
        let client = SubgraphClient::new(graph_config("http://127.0.0.1:1/id"), 1).unwrap();
        assert_eq!(client.fetch("Graph Network", "{ epoches { id } }").await, None);
    }

    #[tokio::test]
    async fn graphql_errors_in_a_200_body_pass_through() {
        let router = Router::new().route(
            "/deploy-a",
            post(|| async {
                Json(serde_json::json!({"errors": [{"message": "field not found"}]}))
            }),
        );
        let base = spawn_server(router).await;

        let client = SubgraphClient::new(graph_config(&base), 5).unwrap();
        let result = client.fetch("Graph Network", "{ bogus }").await.unwrap();
        assert_eq!(result["errors"][0]["message"], "field not found");
    }
}
