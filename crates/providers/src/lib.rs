//! Model API clients for rosterbot.
//!
//! All providers implement the `rosterbot_core::Provider` trait. The demo
//! defaults to a local Ollama endpoint; anything speaking the OpenAI chat
//! completions dialect works.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
