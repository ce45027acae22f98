//! The single-shot chatbot — the baseline the agent is contrasted with.
//!
//! Each question is one provider call: a fixed system prompt plus the
//! question. No database, no memory, no pipeline. Ask it "how many users
//! signed up?" and it can only guess.

use crate::prompts;
use crate::usage::{UsageSnapshot, UsageTotals};
use rosterbot_core::error::Error;
use rosterbot_core::message::Conversation;
use rosterbot_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;

/// A single-turn prompt-to-response chatbot.
pub struct Chatbot {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    usage: UsageTotals,
}

impl Chatbot {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1024,
            usage: UsageTotals::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Accumulated token usage for this session.
    pub fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }

    /// Answer one question. Each call is independent.
    pub async fn ask(&self, question: &str) -> Result<String, Error> {
        let conv = Conversation::prompt(prompts::CHATBOT_SYSTEM, question);
        let request = ProviderRequest::new(&self.model, conv.messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        self.usage.record(response.usage);
        Ok(response.text().to_string())
    }
}
