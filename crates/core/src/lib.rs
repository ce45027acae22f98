//! # Rosterbot Core
//!
//! Domain types, traits, and error definitions for the rosterbot demo.
//! This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The provider abstraction is a trait here; the HTTP implementation lives in
//! `rosterbot-providers`. The same goes for the signup store and the SQL
//! policy. All crates depend inward on core, which keeps the dependency graph
//! clean and makes the agent pipeline testable with mock implementations.

pub mod error;
pub mod exchange;
pub mod message;
pub mod provider;
pub mod signup;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use exchange::{Exchange, ExchangeLog};
pub use message::{Conversation, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use signup::{Signup, SignupStatus};
