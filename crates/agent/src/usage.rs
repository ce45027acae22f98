//! Session-level token accounting.
//!
//! Every provider call reports token usage; the REPL `usage` command shows
//! the running totals. Counters are atomic so the pipeline can record usage
//! through a shared reference.

use rosterbot_core::provider::Usage;
use std::sync::atomic::{AtomicU64, Ordering};

/// Accumulated token usage for the current session.
#[derive(Debug, Default)]
pub struct UsageTotals {
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    requests: AtomicU64,
}

/// A point-in-time copy of the totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub requests: u64,
}

impl UsageTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one provider call's usage (None still counts the request).
    pub fn record(&self, usage: Option<Usage>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(usage) = usage {
            self.prompt_tokens
                .fetch_add(u64::from(usage.prompt_tokens), Ordering::Relaxed);
            self.completion_tokens
                .fetch_add(u64::from(usage.completion_tokens), Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let prompt_tokens = self.prompt_tokens.load(Ordering::Relaxed);
        let completion_tokens = self.completion_tokens.load(Ordering::Relaxed);
        UsageSnapshot {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            requests: self.requests.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for UsageSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requests, {} prompt + {} completion = {} tokens",
            self.requests, self.prompt_tokens, self.completion_tokens, self.total_tokens
        )
    }
}
