//! Prompt templates for each pipeline node and for the chatbot.
//!
//! Each node sends a short system instruction plus one user prompt built
//! here. Memory blocks come pre-rendered from `ExchangeLog::context_block`
//! and are empty strings when there is no history.

/// System instruction for the Decide node.
pub const DECIDE_SYSTEM: &str = "You are analyzing if a question needs database access.";

/// System instruction for SQL generation.
pub const SQL_SYSTEM: &str =
    "You are a SQL query generator. Convert natural language questions to SQL queries.";

/// System instruction for turning rows into prose.
pub const FORMAT_SYSTEM: &str =
    "Convert database query results into a natural, conversational answer.";

/// System instruction for plain (non-database) answers.
pub const PLAIN_SYSTEM: &str = "You are a helpful, conversational assistant.";

/// System instruction for the chatbot mode.
pub const CHATBOT_SYSTEM: &str =
    "You are a helpful assistant. Answer the user's question directly and conversationally.";

/// The Decide node's user prompt: should this question hit the database?
pub fn decide(question: &str, memory_block: &str) -> String {
    format!(
        "{memory_block}\
Current question: \"{question}\"

The database contains user signup information with:
- username, email, signup_date, week_number, status

Does this question require querying the database? Consider:
- Questions about users, signups, counts, dates, weeks need the database
- General questions, greetings, clarifications may not
- Follow-up questions may reference previous answers

Answer ONLY with: YES or NO

Answer:"
    )
}

/// The SQL-generation prompt: schema + sample + history + question → JSON.
pub fn generate_sql(schema: &str, sample: &str, memory_block: &str, question: &str) -> String {
    format!(
        "{schema}

Sample data (first rows):
{sample}

{memory_block}\
Current question: \"{question}\"

Generate a SQL query to answer this question. Consider:
- Use SELECT to retrieve data
- Use COUNT() for counting
- Use WHERE to filter (e.g., week_number, status, date ranges)
- Use GROUP BY for aggregations

Respond with ONLY a valid JSON object:
{{
    \"sql_query\": \"SELECT username, email FROM signups WHERE week_number = 1\",
    \"intent\": \"list_users_by_week\",
    \"description\": \"Get users who signed up in week 1\"
}}

Do not include any text before or after the JSON.

JSON Response:"
    )
}

/// The row-formatting prompt: question + intent + rows → prose.
pub fn format_answer(question: &str, intent: &str, rows_json: &str) -> String {
    format!(
        "Question: \"{question}\"
Query intent: {intent}

Data retrieved:
{rows_json}

Generate a natural language answer that:
- Directly answers the question
- Is conversational and friendly
- Includes relevant details from the data
- Uses appropriate formatting (lists for multiple items)

Answer:"
    )
}

/// The plain-answer prompt for questions that skip the database.
pub fn plain_answer(question: &str, memory_block: &str) -> String {
    format!(
        "{memory_block}\
Current question: \"{question}\"

Provide a helpful, natural, and conversational response.

Response:"
    )
}
