//! `rosterbot init-db` — Create the signup database and seed sample data.

use rosterbot_config::AppConfig;
use rosterbot_store::SignupStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let path = &config.database.path;

    let store = SignupStore::open(path).await?;

    if store.seed_if_empty().await? {
        println!("Created {path} and seeded sample data.");
    } else {
        println!("{path} already exists with {} signups; left untouched.", store.count().await?);
    }

    Ok(())
}
