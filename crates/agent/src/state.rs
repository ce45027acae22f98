//! Pipeline state and routing.

use rosterbot_core::exchange::ExchangeLog;
use serde_json::Value;

/// The stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Decide,
    QueryDb,
    Answer,
}

/// What the QueryDb node produced.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// The query ran; rows may be empty.
    Answered {
        intent: String,
        sql: String,
        rows: Vec<serde_json::Map<String, Value>>,
        answer: String,
    },
    /// Generation, validation, or execution failed.
    Failed { reason: String },
}

impl QueryOutcome {
    /// The user-visible answer for this outcome.
    pub fn answer_text(&self) -> String {
        match self {
            QueryOutcome::Answered { answer, .. } => answer.clone(),
            QueryOutcome::Failed { reason } => {
                format!("I encountered an error while querying the database: {reason}")
            }
        }
    }
}

/// Mutable state threaded through one turn, plus the memory that survives
/// across turns.
#[derive(Debug, Default)]
pub struct AgentState {
    /// The question being processed this turn
    pub question: String,

    /// Decide's verdict
    pub needs_db: bool,

    /// QueryDb's result, if that node ran
    pub outcome: Option<QueryOutcome>,

    /// The final answer for this turn
    pub answer: Option<String>,

    /// Conversational memory across turns
    pub memory: ExchangeLog,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-turn fields and set the new question.
    ///
    /// Memory is deliberately left intact.
    pub fn begin_turn(&mut self, question: impl Into<String>) {
        self.question = question.into();
        self.needs_db = false;
        self.outcome = None;
        self.answer = None;
    }
}

/// The conditional edge out of Decide.
pub fn route_after_decide(state: &AgentState) -> Node {
    if state.needs_db {
        Node::QueryDb
    } else {
        Node::Answer
    }
}
