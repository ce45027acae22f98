//! SQL statement policy — the read-only gate for generated queries.
//!
//! Rules:
//! - the statement must begin with `SELECT`
//! - no write/DDL keywords anywhere (INSERT, UPDATE, DELETE, DROP, ...)
//! - exactly one statement (a single trailing `;` is tolerated)
//! - every table referenced after `FROM`/`JOIN` must be in the allowlist
//!
//! Keyword and table checks operate on whole tokens, not substrings, so a
//! column named `created_at` does not trip the CREATE check.

use rosterbot_core::error::PolicyError;
use tracing::warn;

/// Keywords that never appear in a read-only statement.
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "REPLACE", "ATTACH", "DETACH",
    "PRAGMA", "VACUUM", "TRUNCATE",
];

/// Result of checking a statement against the policy.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlCheckResult {
    /// Statement is allowed
    Allowed,
    /// Statement is denied
    Denied { statement: String, reason: String },
}

/// Read-only statement policy with a table allowlist.
#[derive(Debug, Clone)]
pub struct SqlPolicy {
    allowed_tables: Vec<String>,
}

impl SqlPolicy {
    /// Create a policy allowing the given tables (case-insensitive).
    pub fn new(allowed_tables: &[String]) -> Self {
        Self {
            allowed_tables: allowed_tables.iter().map(|t| t.to_ascii_lowercase()).collect(),
        }
    }

    /// Check a statement against the policy.
    pub fn check(&self, sql: &str) -> SqlCheckResult {
        let trimmed = sql.trim();

        if trimmed.is_empty() {
            return self.deny(sql, "empty statement");
        }

        // A single trailing semicolon is fine; anything more means multiple
        // statements were smuggled in.
        let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
        if body.contains(';') {
            return self.deny(sql, "multiple statements are not allowed");
        }

        let tokens: Vec<String> = tokenize(body);

        match tokens.first().map(String::as_str) {
            Some("SELECT") => {}
            _ => return self.deny(sql, "only SELECT statements are allowed"),
        }

        for token in &tokens {
            if FORBIDDEN_KEYWORDS.contains(&token.as_str()) {
                return self.deny(sql, &format!("forbidden keyword {token}"));
            }
        }

        // Every table after FROM/JOIN must be allowlisted. A SELECT directly
        // after FROM is a subquery; its own FROM is caught by the same scan.
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i] == "FROM" || tokens[i] == "JOIN" {
                if let Some(next) = tokens.get(i + 1) {
                    if next != "SELECT" {
                        let table = next.to_ascii_lowercase();
                        if !self.allowed_tables.contains(&table) {
                            return self.deny(sql, &format!("table '{table}' is not allowed"));
                        }
                    }
                }
            }
            i += 1;
        }

        SqlCheckResult::Allowed
    }

    /// Check a statement and convert a denial into a `PolicyError`.
    pub fn enforce(&self, sql: &str) -> Result<(), PolicyError> {
        match self.check(sql) {
            SqlCheckResult::Allowed => Ok(()),
            SqlCheckResult::Denied { statement, reason } => {
                Err(PolicyError::Rejected { statement, reason })
            }
        }
    }

    fn deny(&self, statement: &str, reason: &str) -> SqlCheckResult {
        warn!(statement, reason, "SQL statement denied");
        SqlCheckResult::Denied {
            statement: statement.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Split a statement into uppercase word tokens.
///
/// Identifiers keep underscores; quoting characters are separators, so
/// `"signups"` and `signups` tokenize identically.
fn tokenize(sql: &str) -> Vec<String> {
    sql.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_uppercase())
        .collect()
}
