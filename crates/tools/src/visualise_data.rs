//! The `visualise_data` tool: render a price card for a symbol.
//!
//! The model supplies the symbol, price, and delta itself; the tool is a
//! pure rendering step with a fixed latency so the client shows the
//! skeleton card before the data lands.

use graphchat_core::tool::{PriceCardArgs, ToolDefinition};
use graphchat_core::view::PriceCard;
use tracing::debug;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "visualise_data".into(),
        description:
            "Get the current stock price of a given stock or currency. Use this to show the price to the user."
                .into(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "The name or symbol of the stock or currency. e.g. DOGE/AAPL/USD."
                },
                "price": {
                    "type": "number",
                    "description": "The price of the stock."
                },
                "delta": {
                    "type": "number",
                    "description": "The change in price of the stock"
                }
            },
            "required": ["symbol", "price", "delta"]
        }),
    }
}

pub async fn run(args: &PriceCardArgs) -> PriceCard {
    debug!(symbol = %args.symbol, "Rendering price card");
    tokio::time::sleep(crate::TOOL_LATENCY).await;
    PriceCard {
        symbol: args.symbol.clone(),
        price: args.price,
        delta: args.delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_requires_all_fields() {
        let def = definition();
        let required = def.parameters["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_echoes_args_into_card() {
        let card = run(&PriceCardArgs {
            symbol: "DOGE".into(),
            price: 0.12,
            delta: 0.01,
        })
        .await;
        assert_eq!(card.symbol, "DOGE");
        assert_eq!(card.price, 0.12);
        assert_eq!(card.delta, 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn run_waits_the_fixed_latency() {
        let start = tokio::time::Instant::now();
        let _ = run(&PriceCardArgs {
            symbol: "GRT".into(),
            price: 0.2,
            delta: -0.01,
        })
        .await;
        assert!(start.elapsed() >= crate::TOOL_LATENCY);
    }
}
