//! Provider selection — builds the right client from configuration.

use crate::openai_compat::OpenAiCompatProvider;
use rosterbot_config::AppConfig;
use rosterbot_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// `provider.kind` selects the constructor:
/// - `"ollama"` — local endpoint, placeholder key
/// - `"openai"` — hosted OpenAI, key required at request time
/// - anything else — a custom OpenAI-compatible endpoint at `base_url`
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    let provider = &config.provider;
    let api_key = provider.api_key.clone().unwrap_or_default();

    match provider.kind.as_str() {
        "ollama" => Arc::new(OpenAiCompatProvider::ollama(Some(&provider.base_url))),
        "openai" => Arc::new(OpenAiCompatProvider::openai(api_key)),
        other => Arc::new(OpenAiCompatProvider::new(other, &provider.base_url, api_key)),
    }
}
