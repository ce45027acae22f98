//! `rosterbot schema` — Print the database schema and sample rows.

use rosterbot_config::AppConfig;
use rosterbot_store::SignupStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let store = SignupStore::open(&config.database.path).await?;

    println!("{}", store.schema().await?);
    println!("Sample data (first 5 rows):");
    println!("{}", store.sample_json(5).await?);

    Ok(())
}
