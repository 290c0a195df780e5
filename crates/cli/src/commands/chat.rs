//! `graphchat chat` — Interactive conversation mode.
//!
//! A staged request pauses the loop for a yes/no confirmation before the
//! fetch runs, mirroring the confirm button of the web client.

use graphchat_chat::ChatEngine;
use graphchat_core::message::ChatHandle;
use graphchat_core::view::View;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let engine = super::build_engine(&config)?;
    let chat = ChatHandle::default();

    println!();
    println!("  GraphChat — Interactive Mode");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Protocols: {}", protocol_list(&config));
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim().to_string();
        if text.is_empty() {
            continue;
        }
        if text == "exit" {
            break;
        }

        let mut turn = match engine.submit_user_message(&chat, text).await {
            Ok(turn) => turn,
            Err(e) => {
                eprintln!("  [Error] {e}");
                continue;
            }
        };

        eprint!("  ...");
        let view = turn.view.wait_done().await;
        eprint!("\r     \r");

        let Some(view) = view else {
            eprintln!("  [Error] turn ended without a result");
            continue;
        };

        println!();
        for line in super::render(&view).lines() {
            println!("  GraphChat > {line}");
        }
        println!();

        if let View::StagedRequest { request } = view {
            confirm_staged(&engine, &chat, &mut lines, request).await?;
        }
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

async fn confirm_staged(
    engine: &ChatEngine,
    chat: &ChatHandle,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    request: graphchat_core::view::StagedRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    print!("  Run this request now? [y/N] ");
    std::io::stdout().flush()?;

    let answer = lines.next_line().await?.unwrap_or_default();
    if !matches!(answer.trim(), "y" | "Y" | "yes") {
        println!("  Skipped.");
        println!();
        return Ok(());
    }

    let mut handles = engine.confirm_request(chat, request.graphql_query, request.protocol);

    eprint!("  ...");
    let note = handles.note.wait_done().await;
    eprint!("\r     \r");

    match note {
        Some(view) => {
            println!();
            for line in super::render(&view).lines() {
                println!("  GraphChat > {line}");
            }
            println!();
        }
        None => eprintln!("  [Error] confirmation ended without a result"),
    }

    Ok(())
}

fn protocol_list(config: &graphchat_config::AppConfig) -> String {
    let mut names: Vec<&str> = config.graph.protocols.keys().map(String::as_str).collect();
    names.sort_unstable();
    names.join(", ")
}
