//! Conversational memory for the agent pipeline.
//!
//! The agent remembers completed question/answer pairs and feeds the most
//! recent ones back into its prompts so follow-up questions resolve
//! ("who signed up in week 1?" … "and how many of those are active?").
//! Memory is in-process only; the REPL `reset` command clears it.

use serde::{Deserialize, Serialize};

/// One completed question/answer pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// An append-only log of exchanges with windowed recall.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeLog {
    entries: Vec<Exchange>,
}

impl ExchangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed exchange.
    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.entries.push(Exchange {
            question: question.into(),
            answer: answer.into(),
        });
    }

    /// The most recent `n` exchanges, oldest first.
    pub fn recent(&self, n: usize) -> &[Exchange] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Render the most recent `n` exchanges as a prompt context block.
    ///
    /// Returns an empty string when there is no history, so callers can
    /// splice the result into a prompt unconditionally.
    pub fn context_block(&self, n: usize) -> String {
        let recent = self.recent(n);
        if recent.is_empty() {
            return String::new();
        }

        let mut block = String::from("Recent conversation:\n");
        for exchange in recent {
            block.push_str(&format!("Q: {}\nA: {}\n", exchange.question, exchange.answer));
        }
        block
    }

    /// Forget everything (REPL `reset`).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
