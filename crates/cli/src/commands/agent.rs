//! `rosterbot agent` — Interactive or single-message agent mode.

use rosterbot_agent::{AgentPipeline, AgentState};
use rosterbot_config::AppConfig;
use rosterbot_security::SqlPolicy;
use rosterbot_store::SignupStore;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let store = Arc::new(
        SignupStore::open(&config.database.path)
            .await?
            .with_max_rows(config.database.max_result_rows),
    );
    if config.database.seed {
        store.seed_if_empty().await?;
    }

    let provider = rosterbot_providers::build_from_config(&config);
    let policy = SqlPolicy::new(&config.database.allowed_tables);

    let pipeline = AgentPipeline::new(provider, store.clone(), policy, &config.provider.model)
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens)
        .with_memory_window(config.agent.memory_window)
        .with_answer_rows(config.agent.answer_rows);

    let mut state = AgentState::new();

    if let Some(question) = message {
        // Single message mode
        let answer = pipeline.run_turn(&mut state, &question).await?;
        println!("{answer}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  rosterbot agent — ask about user signups");
    println!();
    println!("  Database:  {}", config.database.path);
    println!("  Model:     {} via {}", config.provider.model, config.provider.kind);
    println!();
    println!("  Example questions:");
    println!("    - How many users signed up?");
    println!("    - Show me users from week 1");
    println!("    - Who signed up in January?");
    println!("    - List all active users");
    println!();
    println!("  Commands: exit, reset, schema, usage");
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
            "reset" => {
                state.memory.clear();
                println!("\n  Conversation memory cleared.\n");
            }
            "schema" => match schema_report(&store).await {
                Ok(report) => println!("\n{report}"),
                Err(e) => eprintln!("\n  [Error] {e}\n"),
            },
            "usage" => {
                println!("\n  Session usage: {}\n", pipeline.usage());
            }
            question => match pipeline.run_turn(&mut state, question).await {
                Ok(answer) => {
                    println!();
                    for line in answer.lines() {
                        println!("  Agent > {line}");
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

async fn schema_report(store: &SignupStore) -> Result<String, Box<dyn std::error::Error>> {
    let schema = store.schema().await?;
    let sample = store.sample_json(5).await?;
    Ok(format!("{schema}\nSample data (first 5 rows):\n{sample}\n"))
}
