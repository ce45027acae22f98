//! The Decide → QueryDb → Answer pipeline.
//!
//! One `run_turn` call processes one question:
//! Decide routes to QueryDb or straight to Answer; QueryDb failures become
//! explanatory answers rather than turn failures; Answer records the
//! exchange in memory. A provider failure in the Answer node is the only
//! thing that fails the turn.

use crate::extract::GeneratedQuery;
use crate::prompts;
use crate::state::{AgentState, Node, QueryOutcome, route_after_decide};
use crate::usage::{UsageSnapshot, UsageTotals};
use rosterbot_core::error::Error;
use rosterbot_core::message::Conversation;
use rosterbot_core::provider::{Provider, ProviderRequest, ProviderResponse};
use rosterbot_security::SqlPolicy;
use rosterbot_store::SignupStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The agent pipeline: provider, store, and policy wired together.
pub struct AgentPipeline {
    provider: Arc<dyn Provider>,
    store: Arc<SignupStore>,
    policy: SqlPolicy,
    model: String,
    temperature: f32,
    max_tokens: u32,
    memory_window: usize,
    answer_rows: usize,
    usage: UsageTotals,
}

impl AgentPipeline {
    /// Create a pipeline with default tuning.
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<SignupStore>,
        policy: SqlPolicy,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            policy,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1024,
            memory_window: 3,
            answer_rows: 10,
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

    /// How many past exchanges each prompt sees.
    pub fn with_memory_window(mut self, window: usize) -> Self {
        self.memory_window = window;
        self
    }

    /// How many result rows the formatting prompt sees.
    pub fn with_answer_rows(mut self, rows: usize) -> Self {
        self.answer_rows = rows;
        self
    }

    /// Accumulated token usage for this session.
    pub fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot()
    }

    /// Process one question through the pipeline.
    pub async fn run_turn(&self, state: &mut AgentState, question: &str) -> Result<String, Error> {
        state.begin_turn(question);
        info!(question, "Processing question");

        let mut node = Node::Decide;
        let answer = loop {
            node = match node {
                Node::Decide => {
                    state.needs_db = self.decide(state).await;
                    debug!(needs_db = state.needs_db, "Decide verdict");
                    route_after_decide(state)
                }
                Node::QueryDb => {
                    state.outcome = Some(self.query_db(state).await);
                    Node::Answer
                }
                Node::Answer => break self.answer(state).await?,
            };
        };

        state.memory.record(question, &answer);
        state.answer = Some(answer.clone());
        Ok(answer)
    }

    /// One provider call with this pipeline's sampling settings.
    async fn complete(&self, system: &str, user: String) -> Result<ProviderResponse, Error> {
        let conv = Conversation::prompt(system, user);
        let request = ProviderRequest::new(&self.model, conv.messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        self.usage.record(response.usage);
        Ok(response)
    }

    /// Decide node: does this question need the database?
    ///
    /// A provider failure here degrades to "no" so the turn can still
    /// produce a plain answer.
    async fn decide(&self, state: &AgentState) -> bool {
        let memory_block = state.memory.context_block(self.memory_window);
        let prompt = prompts::decide(&state.question, &memory_block);

        match self.complete(prompts::DECIDE_SYSTEM, prompt).await {
            Ok(response) => response.text().to_ascii_uppercase().contains("YES"),
            Err(e) => {
                warn!(error = %e, "Decide node failed, answering without the database");
                false
            }
        }
    }

    /// QueryDb node: generate, validate, execute, and narrate a query.
    ///
    /// Never fails the turn — every failure mode collapses into a
    /// `QueryOutcome::Failed` whose reason becomes the answer.
    async fn query_db(&self, state: &AgentState) -> QueryOutcome {
        let schema = match self.store.schema().await {
            Ok(schema) => schema,
            Err(e) => {
                return QueryOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        // Sample rows are nice-to-have context; generation proceeds without
        // them if the read fails.
        let sample = match self.store.sample_json(3).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "Could not read sample rows for prompt context");
                String::from("[]")
            }
        };

        let memory_block = state.memory.context_block(self.memory_window);
        let prompt = prompts::generate_sql(&schema, &sample, &memory_block, &state.question);

        let generated = match self.complete(prompts::SQL_SYSTEM, prompt).await {
            Ok(response) => GeneratedQuery::parse(response.text()),
            Err(e) => {
                return QueryOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        info!(sql = %generated.sql_query, intent = %generated.intent, "Generated SQL");

        if let Err(e) = self.policy.enforce(&generated.sql_query) {
            return QueryOutcome::Failed {
                reason: e.to_string(),
            };
        }

        let rows = match self.store.select(&generated.sql_query).await {
            Ok(rows) => rows,
            Err(e) => {
                return QueryOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if rows.is_empty() {
            return QueryOutcome::Answered {
                intent: generated.intent,
                sql: generated.sql_query,
                rows,
                answer: "I couldn't find any data matching your question.".into(),
            };
        }

        let shown: Vec<_> = rows.iter().take(self.answer_rows).collect();
        let rows_json = serde_json::to_string_pretty(&shown).unwrap_or_else(|_| "[]".into());
        let prompt = prompts::format_answer(&state.question, &generated.intent, &rows_json);

        match self.complete(prompts::FORMAT_SYSTEM, prompt).await {
            Ok(response) => QueryOutcome::Answered {
                intent: generated.intent,
                sql: generated.sql_query,
                rows,
                answer: response.text().to_string(),
            },
            Err(e) => QueryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Answer node: final response for the turn.
    async fn answer(&self, state: &AgentState) -> Result<String, Error> {
        if let Some(outcome) = &state.outcome {
            return Ok(outcome.answer_text());
        }

        let memory_block = state.memory.context_block(self.memory_window);
        let prompt = prompts::plain_answer(&state.question, &memory_block);
        let response = self.complete(prompts::PLAIN_SYSTEM, prompt).await?;
        Ok(response.text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rosterbot_core::error::ProviderError;
    use rosterbot_core::message::Message;
    use rosterbot_core::provider::Usage;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A provider that replays scripted responses and records every request.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request_text(&self, index: usize) -> String {
            let requests = self.requests.lock().unwrap();
            requests[index]
                .messages
                .iter()
                .map(|m| m.content.clone())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(content) => Ok(ProviderResponse {
                    message: Message::assistant(content),
                    usage: Some(Usage {
                        prompt_tokens: 10,
                        completion_tokens: 5,
                        total_tokens: 15,
                    }),
                    model: "scripted".into(),
                }),
                None => Err(ProviderError::Network("script exhausted".into())),
            }
        }
    }

    async fn pipeline_with(provider: Arc<ScriptedProvider>) -> AgentPipeline {
        let store = Arc::new(SignupStore::open_in_memory().await.unwrap());
        store.seed_if_empty().await.unwrap();
        let policy = SqlPolicy::new(&["signups".to_string()]);
        AgentPipeline::new(provider, store, policy, "scripted")
    }

    #[tokio::test]
    async fn plain_question_skips_database() {
        let provider = ScriptedProvider::new(&["NO", "Hello! How can I help?"]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline.run_turn(&mut state, "hello there").await.unwrap();

        assert_eq!(answer, "Hello! How can I help?");
        assert!(state.outcome.is_none());
        assert_eq!(provider.request_count(), 2);
        assert_eq!(state.memory.len(), 1);
    }

    #[tokio::test]
    async fn database_question_runs_full_pipeline() {
        let provider = ScriptedProvider::new(&[
            "YES",
            r#"{"sql_query": "SELECT COUNT(*) AS n FROM signups", "intent": "count_users", "description": "Count signups"}"#,
            "There are 6 users signed up.",
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline
            .run_turn(&mut state, "How many users signed up?")
            .await
            .unwrap();

        assert_eq!(answer, "There are 6 users signed up.");
        match state.outcome.as_ref().unwrap() {
            QueryOutcome::Answered { intent, sql, rows, .. } => {
                assert_eq!(intent, "count_users");
                assert!(sql.contains("COUNT"));
                assert_eq!(rows[0]["n"], serde_json::json!(6));
            }
            other => panic!("expected Answered outcome, got {other:?}"),
        }
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn malformed_json_uses_fallback_query() {
        let provider = ScriptedProvider::new(&[
            "YES",
            "I am not able to produce SQL for that.",
            "Here are the signups I found.",
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline.run_turn(&mut state, "show signups").await.unwrap();

        assert_eq!(answer, "Here are the signups I found.");
        match state.outcome.as_ref().unwrap() {
            QueryOutcome::Answered { sql, rows, .. } => {
                assert_eq!(sql, "SELECT * FROM signups LIMIT 10");
                assert_eq!(rows.len(), 6);
            }
            other => panic!("expected Answered outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn denied_statement_becomes_explanatory_answer() {
        let provider = ScriptedProvider::new(&[
            "YES",
            r#"{"sql_query": "DROP TABLE signups", "intent": "mischief", "description": ""}"#,
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline.run_turn(&mut state, "drop everything").await.unwrap();

        assert!(answer.contains("error while querying"));
        assert!(answer.contains("only SELECT"));
        assert!(matches!(
            state.outcome,
            Some(QueryOutcome::Failed { .. })
        ));
        // No formatting call happens for a denied statement.
        assert_eq!(provider.request_count(), 2);
        // The table is untouched.
        assert_eq!(pipeline.store.count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn disallowed_table_becomes_explanatory_answer() {
        let provider = ScriptedProvider::new(&[
            "YES",
            r#"{"sql_query": "SELECT * FROM accounts", "intent": "x", "description": ""}"#,
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline.run_turn(&mut state, "list accounts").await.unwrap();
        assert!(answer.contains("'accounts'"));
    }

    #[tokio::test]
    async fn empty_result_answers_without_formatting_call() {
        let provider = ScriptedProvider::new(&[
            "YES",
            r#"{"sql_query": "SELECT * FROM signups WHERE username = 'Nobody'", "intent": "find_user", "description": ""}"#,
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline.run_turn(&mut state, "find Nobody").await.unwrap();

        assert_eq!(answer, "I couldn't find any data matching your question.");
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn broken_sql_becomes_explanatory_answer() {
        let provider = ScriptedProvider::new(&[
            "YES",
            r#"{"sql_query": "SELECT nope FROM signups", "intent": "x", "description": ""}"#,
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        let answer = pipeline.run_turn(&mut state, "bad column").await.unwrap();
        assert!(answer.contains("error while querying"));
    }

    /// Fails the first call, then delegates to a scripted provider.
    struct FailFirst {
        inner: Arc<ScriptedProvider>,
        failed: Mutex<bool>,
    }

    #[async_trait]
    impl Provider for FailFirst {
        fn name(&self) -> &str {
            "fail-first"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            {
                let mut failed = self.failed.lock().unwrap();
                if !*failed {
                    *failed = true;
                    return Err(ProviderError::Timeout("decide timed out".into()));
                }
            }
            self.inner.complete(request).await
        }
    }

    #[tokio::test]
    async fn decide_failure_degrades_to_plain_answer() {
        let scripted = ScriptedProvider::new(&["A plain answer."]);
        let provider = Arc::new(FailFirst {
            inner: scripted,
            failed: Mutex::new(false),
        });

        let store = Arc::new(SignupStore::open_in_memory().await.unwrap());
        store.seed_if_empty().await.unwrap();
        let pipeline = AgentPipeline::new(
            provider,
            store,
            SqlPolicy::new(&["signups".to_string()]),
            "scripted",
        );

        let mut state = AgentState::new();
        let answer = pipeline.run_turn(&mut state, "hello").await.unwrap();
        assert_eq!(answer, "A plain answer.");
        assert!(!state.needs_db);
    }

    #[tokio::test]
    async fn memory_context_reaches_later_prompts() {
        let provider = ScriptedProvider::new(&[
            "NO",
            "Hi, I'm rosterbot.",
            "NO",
            "You asked who I am.",
        ]);
        let pipeline = pipeline_with(provider.clone()).await;
        let mut state = AgentState::new();

        pipeline.run_turn(&mut state, "who are you?").await.unwrap();
        pipeline
            .run_turn(&mut state, "what did I just ask?")
            .await
            .unwrap();

        // The second turn's decide prompt (request index 2) carries the
        // first exchange.
        let decide_prompt = provider.request_text(2);
        assert!(decide_prompt.contains("Recent conversation:"));
        assert!(decide_prompt.contains("who are you?"));
        assert!(decide_prompt.contains("Hi, I'm rosterbot."));
    }

    #[tokio::test]
    async fn memory_window_limits_context() {
        let mut script: Vec<String> = Vec::new();
        for i in 0..4 {
            script.push("NO".into());
            script.push(format!("answer {i}"));
        }
        let script_refs: Vec<&str> = script.iter().map(String::as_str).collect();
        let provider = ScriptedProvider::new(&script_refs);
        let pipeline = pipeline_with(provider.clone()).await.with_memory_window(2);
        let mut state = AgentState::new();

        for i in 0..4 {
            pipeline
                .run_turn(&mut state, &format!("question {i}"))
                .await
                .unwrap();
        }

        // The fourth turn's decide prompt sees questions 1 and 2, not 0.
        let decide_prompt = provider.request_text(6);
        assert!(decide_prompt.contains("question 2"));
        assert!(decide_prompt.contains("question 1"));
        assert!(!decide_prompt.contains("question 0"));
    }

    #[tokio::test]
    async fn usage_accumulates_across_calls() {
        let provider = ScriptedProvider::new(&["NO", "hello"]);
        let pipeline = pipeline_with(provider).await;
        let mut state = AgentState::new();

        pipeline.run_turn(&mut state, "hi").await.unwrap();

        let usage = pipeline.usage();
        assert_eq!(usage.requests, 2);
        assert_eq!(usage.total_tokens, 30);
    }
}
