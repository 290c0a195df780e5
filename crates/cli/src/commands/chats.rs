//! `graphchat chats` — List saved conversations.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let engine = super::build_engine(&config)?;

    let records = engine.list_chats().await?;
    if records.is_empty() {
        println!("  No saved chats.");
        if config.storage.user_id.is_none() {
            println!("  (set storage.user_id in config.toml to enable persistence)");
        }
        return Ok(());
    }

    for record in records {
        println!(
            "  {}  {}  {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.id,
            record.title
        );
    }

    Ok(())
}
