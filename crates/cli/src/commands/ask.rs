//! `graphchat ask` — Send one message and print the reply.

use graphchat_core::message::ChatHandle;
use tracing::debug;

pub async fn run(text: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let engine = super::build_engine(&config)?;
    let chat = ChatHandle::default();
    debug!(chat_id = %chat.id(), model = %config.model, "Single-shot turn");

    eprint!("  Thinking...");
    let mut turn = engine.submit_user_message(&chat, text).await?;
    let view = turn
        .view
        .wait_done()
        .await
        .ok_or("turn ended without a result")?;
    eprint!("\r              \r");

    println!("{}", super::render(&view));

    Ok(())
}
