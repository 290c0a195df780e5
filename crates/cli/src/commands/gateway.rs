//! `graphchat gateway` — Start the HTTP API server.

use tracing::info;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        info!(port, "Port overridden from the command line");
        config.gateway.port = port;
    }

    println!("GraphChat Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);

    graphchat_gateway::start(config).await?;

    Ok(())
}
