//! rosterbot CLI — the main entry point.
//!
//! Commands:
//! - `init-db`  — Create the signup database and seed sample data
//! - `chatbot`  — Single-shot prompt/response mode (no tools)
//! - `agent`    — Database-aware agent mode
//! - `schema`   — Print the database schema and sample rows
//! - `doctor`   — Diagnose provider and database health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "rosterbot",
    about = "rosterbot — chatbot vs. agent over a signup database",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the signup database and seed sample data
    InitDb,

    /// Chat without tools — every question goes straight to the model
    Chatbot {
        /// Send a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Chat with the database-aware agent
    Agent {
        /// Send a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the database schema and sample rows
    Schema,

    /// Diagnose provider and database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::InitDb => commands::init_db::run().await?,
        Commands::Chatbot { message } => commands::chatbot::run(message).await?,
        Commands::Agent { message } => commands::agent::run(message).await?,
        Commands::Schema => commands::schema::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
