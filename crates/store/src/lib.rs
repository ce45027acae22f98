//! SQLite-backed signup store.
//!
//! A single database file with one table, `signups`. The store owns
//! migrations, optional sample-data seeding, schema introspection (used both
//! by the `schema` REPL command and as prompt context for SQL generation),
//! and execution of already-validated SELECT statements with dynamic
//! column decoding.

pub mod rows;

use rosterbot_core::error::StoreError;
use rosterbot_core::signup::{Signup, SignupStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Sample rows inserted by `seed_if_empty` (username, email, date, week, status).
const SEED_SIGNUPS: &[(&str, &str, &str, i64, &str)] = &[
    ("Alice", "alice@example.com", "2024-01-02", 1, "active"),
    ("Bob", "bob@example.com", "2024-01-05", 1, "active"),
    ("Charlie", "charlie@example.com", "2024-01-10", 2, "active"),
    ("Diana", "diana@example.com", "2024-01-15", 3, "active"),
    ("Eve", "eve@example.com", "2024-01-18", 3, "active"),
    ("Frank", "frank@example.com", "2024-01-20", 3, "inactive"),
];

/// The signup database.
pub struct SignupStore {
    pool: SqlitePool,
    max_rows: usize,
}

impl SignupStore {
    /// Open (or create) the database at the given path and run migrations.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // An in-memory database exists per connection, so the pool must not
        // grow past one of them.
        let max_connections = if path == ":memory:" { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            max_rows: 50,
        };
        store.run_migrations().await?;
        info!("Signup store initialized at {path}");
        Ok(store)
    }

    /// Open an in-process ephemeral database (used by tests).
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:").await
    }

    /// Cap the number of rows `select` returns.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Create the signups table if it does not exist.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signups (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL,
                email       TEXT,
                signup_date DATE NOT NULL,
                week_number INTEGER,
                status      TEXT NOT NULL DEFAULT 'active'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("signups table: {e}")))?;

        debug!("Signup store migrations complete");
        Ok(())
    }

    /// Insert the sample rows iff the table is empty.
    ///
    /// Returns whether seeding happened.
    pub async fn seed_if_empty(&self) -> Result<bool, StoreError> {
        if self.count().await? > 0 {
            return Ok(false);
        }

        for (username, email, date, week, status) in SEED_SIGNUPS {
            sqlx::query(
                "INSERT INTO signups (username, email, signup_date, week_number, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(username)
            .bind(email)
            .bind(date)
            .bind(week)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::SeedFailed(format!("inserting {username}: {e}")))?;
        }

        info!(rows = SEED_SIGNUPS.len(), "Seeded signup table with sample data");
        Ok(true)
    }

    /// Total number of signups.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM signups")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT: {e}")))?;
        row.try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("COUNT decode: {e}")))
    }

    /// Human-readable schema description built from `sqlite_master` and
    /// `pragma_table_info`.
    pub async fn schema(&self) -> Result<String, StoreError> {
        let tables = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("sqlite_master: {e}")))?;

        let mut schema = String::from("Database Schema:\n");
        for table_row in &tables {
            let table: String = table_row
                .try_get("name")
                .map_err(|e| StoreError::QueryFailed(format!("table name: {e}")))?;

            schema.push_str(&format!("\nTable: {table}\nColumns:\n"));

            let columns = sqlx::query("SELECT name, type FROM pragma_table_info(?1)")
                .bind(&table)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::QueryFailed(format!("table_info({table}): {e}")))?;

            for col in &columns {
                let name: String = col
                    .try_get("name")
                    .map_err(|e| StoreError::QueryFailed(format!("column name: {e}")))?;
                let ty: String = col.try_get("type").unwrap_or_default();
                schema.push_str(&format!("  - {name} ({ty})\n"));
            }
        }

        Ok(schema)
    }

    /// The first `limit` signups, typed.
    pub async fn sample(&self, limit: usize) -> Result<Vec<Signup>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, username, email, signup_date, week_number, status \
             FROM signups ORDER BY id LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("sample: {e}")))?;

        rows.iter()
            .map(|row| {
                let date_str: String = row
                    .try_get("signup_date")
                    .map_err(|e| StoreError::QueryFailed(format!("signup_date: {e}")))?;
                let signup_date = chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .map_err(|e| StoreError::QueryFailed(format!("signup_date parse: {e}")))?;

                let status_str: String = row
                    .try_get("status")
                    .map_err(|e| StoreError::QueryFailed(format!("status: {e}")))?;
                let status = SignupStatus::from_str(&status_str)
                    .map_err(StoreError::QueryFailed)?;

                Ok(Signup {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::QueryFailed(format!("id: {e}")))?,
                    username: row
                        .try_get("username")
                        .map_err(|e| StoreError::QueryFailed(format!("username: {e}")))?,
                    email: row
                        .try_get("email")
                        .map_err(|e| StoreError::QueryFailed(format!("email: {e}")))?,
                    signup_date,
                    week_number: row
                        .try_get("week_number")
                        .map_err(|e| StoreError::QueryFailed(format!("week_number: {e}")))?,
                    status,
                })
            })
            .collect()
    }

    /// The first `limit` signups as pretty-printed JSON for prompt context.
    pub async fn sample_json(&self, limit: usize) -> Result<String, StoreError> {
        let sample = self.sample(limit).await?;
        serde_json::to_string_pretty(&sample)
            .map_err(|e| StoreError::QueryFailed(format!("sample serialization: {e}")))
    }

    /// Execute an already-validated SELECT statement.
    ///
    /// Returns rows as JSON maps with per-column dynamic decoding. The row
    /// count is capped at `max_rows`; callers validate statements with
    /// `SqlPolicy` before they get here.
    pub async fn select(
        &self,
        sql: &str,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, StoreError> {
        debug!(sql, "Executing generated SELECT");

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        rows.iter()
            .take(self.max_rows)
            .map(rows::row_to_json)
            .collect()
    }

    /// The underlying pool, for tests that need raw access.
    #[cfg(test)]
    fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
