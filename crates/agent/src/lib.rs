//! The rosterbot agent — and the chatbot it is contrasted with.
//!
//! The agent is a fixed three-node pipeline:
//!
//! ```text
//!          ┌──────────┐   needs_db    ┌──────────┐
//!  start ─▶│  Decide  │──────yes─────▶│ QueryDb  │──┐
//!          └──────────┘               └──────────┘  │
//!                │ no                               ▼
//!                └────────────────────────────▶┌──────────┐
//!                                              │  Answer  │─▶ end
//!                                              └──────────┘
//! ```
//!
//! Decide asks the model whether the question needs the database. QueryDb
//! generates a SQL statement, validates it against the read-only policy,
//! executes it, and turns the rows into prose. Answer produces the final
//! response and appends the exchange to conversational memory.
//!
//! The chatbot, by contrast, is one provider call per question: no database,
//! no memory, no pipeline.

pub mod chatbot;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod state;
pub mod usage;

pub use chatbot::Chatbot;
pub use extract::{GeneratedQuery, extract_json};
pub use pipeline::AgentPipeline;
pub use state::{AgentState, Node, QueryOutcome};
pub use usage::{UsageSnapshot, UsageTotals};
