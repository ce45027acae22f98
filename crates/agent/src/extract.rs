//! Recovering structured output from model text.
//!
//! Models asked for "ONLY a valid JSON object" still wrap it in prose or
//! code fences often enough that the demo must cope. `extract_json` pulls
//! the first balanced `{...}` block out of arbitrary text;
//! `GeneratedQuery::parse` layers the demo's fallback semantics on top.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Extract the first JSON object embedded in `text`.
///
/// Scans for a balanced top-level `{...}` block (string-aware, so braces
/// inside string values don't confuse it). Falls back to the greedy
/// first-`{`-to-last-`}` slice if the balanced candidate doesn't parse.
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;

    if let Some(end) = balanced_end(&text[start..]) {
        if let Ok(value) = serde_json::from_str(&text[start..start + end]) {
            return Some(value);
        }
    }

    // Greedy fallback, mirroring the loosest possible read of the output.
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Byte offset one past the `}` closing the object that starts at byte 0.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// The JSON shape the SQL-generation prompt asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub sql_query: String,

    #[serde(default = "default_intent")]
    pub intent: String,

    #[serde(default)]
    pub description: String,
}

fn default_intent() -> String {
    "general_query".into()
}

impl GeneratedQuery {
    /// The query used when the model's output cannot be recovered.
    pub fn fallback() -> Self {
        Self {
            sql_query: "SELECT * FROM signups LIMIT 10".into(),
            intent: default_intent(),
            description: "Default query".into(),
        }
    }

    /// Parse model output, falling back to the default query when no usable
    /// JSON (or no `sql_query` field) can be recovered.
    pub fn parse(text: &str) -> Self {
        let Some(value) = extract_json(text) else {
            warn!("No JSON found in SQL generation output, using fallback query");
            return Self::fallback();
        };

        match serde_json::from_value::<Self>(value) {
            Ok(query) if !query.sql_query.trim().is_empty() => query,
            Ok(_) => {
                warn!("SQL generation output had an empty sql_query, using fallback query");
                Self::fallback()
            }
            Err(e) => {
                warn!(error = %e, "SQL generation output did not match the expected shape");
                Self::fallback()
            }
        }
    }
}
