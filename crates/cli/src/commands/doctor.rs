//! `rosterbot doctor` — Diagnose provider and database health.

use rosterbot_config::AppConfig;
use rosterbot_store::SignupStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("rosterbot doctor — system diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    // Check config
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Config loaded ({} provider)", config.provider.kind);
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            println!("\n  1 issue found. See above for details.");
            return Ok(());
        }
    };

    // Check provider reachability
    let provider = rosterbot_providers::build_from_config(&config);
    match provider.health_check().await {
        Ok(true) => {
            println!("  [ok]   Provider '{}' reachable at {}", provider.name(), config.provider.base_url);

            match provider.list_models().await {
                Ok(models) if models.contains(&config.provider.model) => {
                    println!("  [ok]   Model '{}' available", config.provider.model);
                }
                Ok(models) if models.is_empty() => {
                    println!("  [warn] Provider reported no models");
                    issues += 1;
                }
                Ok(_) => {
                    println!(
                        "  [warn] Model '{}' not in the provider's model list",
                        config.provider.model
                    );
                    issues += 1;
                }
                Err(e) => {
                    println!("  [warn] Could not list models: {e}");
                    issues += 1;
                }
            }
        }
        Ok(false) | Err(_) => {
            println!(
                "  [fail] Provider '{}' unreachable at {} — is it running?",
                provider.name(),
                config.provider.base_url
            );
            issues += 1;
        }
    }

    // Check database
    match SignupStore::open(&config.database.path).await {
        Ok(store) => match store.count().await {
            Ok(count) => {
                println!("  [ok]   Database {} ({count} signups)", config.database.path);
                if count == 0 {
                    println!("  [warn] No signups yet — run `rosterbot init-db`");
                    issues += 1;
                }
            }
            Err(e) => {
                println!("  [fail] Database query failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Could not open {}: {e}", config.database.path);
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
