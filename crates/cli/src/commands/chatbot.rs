//! `rosterbot chatbot` — Single-shot prompt/response mode.
//!
//! The baseline half of the demo: no database, no memory. Ask it about
//! signups and watch it guess.

use rosterbot_agent::Chatbot;
use rosterbot_config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let provider = rosterbot_providers::build_from_config(&config);
    let chatbot = Chatbot::new(provider, &config.provider.model)
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens);

    if let Some(question) = message {
        // Single message mode
        let answer = chatbot.ask(&question).await?;
        println!("{answer}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  rosterbot chatbot — plain single-turn mode");
    println!();
    println!("  Model:     {} via {}", config.provider.model, config.provider.kind);
    println!("  No tools, no database, no memory — each question stands alone.");
    println!();
    println!("  Commands: exit, usage");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    print_prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            print_prompt();
            continue;
        }

        match line {
            "exit" | "quit" => break,
            "usage" => {
                println!("\n  Session usage: {}\n", chatbot.usage());
            }
            question => match chatbot.ask(question).await {
                Ok(answer) => {
                    println!();
                    for line in answer.lines() {
                        println!("  Chatbot > {line}");
                    }
                    println!();
                }
                Err(e) => {
                    eprintln!("\n  [Error] {e}\n");
                }
            },
        }

        print_prompt();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

fn print_prompt() {
    print!("  You > ");
    use std::io::Write;
    let _ = std::io::stdout().flush();
}
