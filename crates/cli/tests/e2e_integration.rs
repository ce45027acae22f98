//! End-to-end integration tests for rosterbot.
//!
//! These exercise the full path from a question to an answer: config
//! defaults, the seeded store, the read-only policy, and the agent pipeline,
//! with only the model scripted.

use std::sync::Arc;

use rosterbot_agent::{AgentPipeline, AgentState, Chatbot, QueryOutcome};
use rosterbot_config::AppConfig;
use rosterbot_core::error::ProviderError;
use rosterbot_core::message::Message;
use rosterbot_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use rosterbot_security::SqlPolicy;
use rosterbot_store::SignupStore;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: std::sync::Mutex<Vec<String>>,
    call_count: std::sync::Mutex<usize>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: std::sync::Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            call_count: std::sync::Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if *count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                *count,
                responses.len()
            );
        }
        let text = responses[*count].clone();
        *count += 1;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "e2e_mock".into(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

async fn seeded_pipeline(provider: Arc<ScriptedProvider>) -> AgentPipeline {
    let config = AppConfig::default();

    let store = Arc::new(
        SignupStore::open_in_memory()
            .await
            .unwrap()
            .with_max_rows(config.database.max_result_rows),
    );
    store.seed_if_empty().await.unwrap();

    let policy = SqlPolicy::new(&config.database.allowed_tables);

    AgentPipeline::new(provider, store, policy, &config.provider.model)
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens)
        .with_memory_window(config.agent.memory_window)
        .with_answer_rows(config.agent.answer_rows)
}

// ── Agent mode ───────────────────────────────────────────────────────────

#[tokio::test]
async fn agent_answers_count_question_from_database() {
    let provider = ScriptedProvider::new(&[
        "YES",
        r#"{"sql_query": "SELECT COUNT(*) AS n FROM signups", "intent": "count_users", "description": "Count all signups"}"#,
        "6 users have signed up so far.",
    ]);
    let pipeline = seeded_pipeline(provider.clone()).await;
    let mut state = AgentState::new();

    let answer = pipeline
        .run_turn(&mut state, "How many users signed up?")
        .await
        .unwrap();

    assert_eq!(answer, "6 users have signed up so far.");
    assert_eq!(provider.calls(), 3);
    match state.outcome.as_ref().unwrap() {
        QueryOutcome::Answered { rows, .. } => {
            assert_eq!(rows[0]["n"], serde_json::json!(6));
        }
        other => panic!("expected Answered outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn agent_filters_by_week_and_status() {
    let provider = ScriptedProvider::new(&[
        "YES",
        r#"{"sql_query": "SELECT username FROM signups WHERE week_number = 3 AND status = 'active'", "intent": "list_users_by_week", "description": "Active week 3 users"}"#,
        "Diana and Eve signed up in week 3 and are still active.",
    ]);
    let pipeline = seeded_pipeline(provider.clone()).await;
    let mut state = AgentState::new();

    pipeline
        .run_turn(&mut state, "Which active users signed up in week 3?")
        .await
        .unwrap();

    match state.outcome.as_ref().unwrap() {
        QueryOutcome::Answered { rows, .. } => {
            let names: Vec<&str> = rows.iter().map(|r| r["username"].as_str().unwrap()).collect();
            assert_eq!(names, ["Diana", "Eve"]);
        }
        other => panic!("expected Answered outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn agent_carries_memory_across_turns() {
    let provider = ScriptedProvider::new(&[
        // Turn 1
        "YES",
        r#"{"sql_query": "SELECT username FROM signups WHERE week_number = 1", "intent": "list_users_by_week", "description": ""}"#,
        "Alice and Bob signed up in week 1.",
        // Turn 2, a follow-up resolved through memory
        "NO",
        "I just told you about Alice and Bob.",
    ]);
    let pipeline = seeded_pipeline(provider.clone()).await;
    let mut state = AgentState::new();

    pipeline
        .run_turn(&mut state, "Who signed up in week 1?")
        .await
        .unwrap();
    let answer = pipeline
        .run_turn(&mut state, "What did you just tell me?")
        .await
        .unwrap();

    assert_eq!(answer, "I just told you about Alice and Bob.");
    assert_eq!(state.memory.len(), 2);
}

#[tokio::test]
async fn agent_refuses_destructive_statement_end_to_end() {
    let provider = ScriptedProvider::new(&[
        "YES",
        r#"{"sql_query": "DELETE FROM signups WHERE status = 'inactive'", "intent": "cleanup", "description": ""}"#,
    ]);
    let pipeline = seeded_pipeline(provider.clone()).await;
    let mut state = AgentState::new();

    let answer = pipeline
        .run_turn(&mut state, "Remove the inactive users")
        .await
        .unwrap();

    assert!(answer.contains("error while querying"));
    assert!(matches!(state.outcome, Some(QueryOutcome::Failed { .. })));
    // Two calls only: decide + generate. No format call for a refused query.
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn agent_reset_forgets_previous_turns() {
    let provider = ScriptedProvider::new(&["NO", "First answer.", "NO", "Second answer."]);
    let pipeline = seeded_pipeline(provider.clone()).await;
    let mut state = AgentState::new();

    pipeline.run_turn(&mut state, "first question").await.unwrap();
    state.memory.clear();
    pipeline.run_turn(&mut state, "second question").await.unwrap();

    assert_eq!(state.memory.len(), 1);
}

#[tokio::test]
async fn agent_session_usage_spans_turns() {
    let provider = ScriptedProvider::new(&["NO", "one", "NO", "two"]);
    let pipeline = seeded_pipeline(provider.clone()).await;
    let mut state = AgentState::new();

    pipeline.run_turn(&mut state, "a").await.unwrap();
    pipeline.run_turn(&mut state, "b").await.unwrap();

    let usage = pipeline.usage();
    assert_eq!(usage.requests, 4);
    assert_eq!(usage.total_tokens, 60);
}

// ── Chatbot mode ─────────────────────────────────────────────────────────

#[tokio::test]
async fn chatbot_answers_without_touching_anything() {
    let provider = ScriptedProvider::new(&["I don't have access to your signup data."]);
    let config = AppConfig::default();
    let chatbot = Chatbot::new(provider.clone(), &config.provider.model)
        .with_temperature(config.provider.temperature)
        .with_max_tokens(config.provider.max_tokens);

    let answer = chatbot.ask("How many users signed up?").await.unwrap();

    assert_eq!(answer, "I don't have access to your signup data.");
    // One call per question — the whole point of the contrast.
    assert_eq!(provider.calls(), 1);
}
