//! Configuration loading, validation, and management for rosterbot.
//!
//! Loads configuration from `rosterbot.toml` in the working directory,
//! falling back to `~/.rosterbot/config.toml`, with environment variable
//! overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `rosterbot.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Signup database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Agent pipeline settings
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Which model API to talk to and how.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider kind: "ollama", "openai", or "custom"
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (optional — local endpoints don't need one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider_kind() -> String {
    "ollama".into()
}
fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Where the signup database lives and how queries against it are bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Insert sample data when the table is empty
    #[serde(default = "default_true")]
    pub seed: bool,

    /// Tables a generated statement may reference
    #[serde(default = "default_allowed_tables")]
    pub allowed_tables: Vec<String>,

    /// Hard cap on rows returned by a generated query
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,
}

fn default_db_path() -> String {
    "signups.db".into()
}
fn default_allowed_tables() -> Vec<String> {
    vec!["signups".into()]
}
fn default_max_result_rows() -> usize {
    50
}
fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            seed: true,
            allowed_tables: default_allowed_tables(),
            max_result_rows: default_max_result_rows(),
        }
    }
}

/// Agent pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// How many past exchanges to include in prompts
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,

    /// How many result rows the answer-formatting prompt may see
    #[serde(default = "default_answer_rows")]
    pub answer_rows: usize,
}

fn default_memory_window() -> usize {
    3
}
fn default_answer_rows() -> usize {
    10
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            memory_window: default_memory_window(),
            answer_rows: default_answer_rows(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("database", &self.database)
            .field("agent", &self.agent)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default locations.
    ///
    /// Search order: `rosterbot.toml` in the working directory, then
    /// `~/.rosterbot/config.toml`, then built-in defaults.
    ///
    /// Environment variable overrides (highest priority):
    /// - `ROSTERBOT_API_KEY`
    /// - `ROSTERBOT_BASE_URL`
    /// - `ROSTERBOT_MODEL`
    /// - `ROSTERBOT_DB_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let local = PathBuf::from("rosterbot.toml");
        let path = if local.exists() {
            local
        } else {
            Self::config_dir().join("config.toml")
        };

        let mut config = Self::load_from(&path)?;

        if let Ok(key) = std::env::var("ROSTERBOT_API_KEY") {
            config.provider.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("ROSTERBOT_BASE_URL") {
            config.provider.base_url = url;
        }
        if let Ok(model) = std::env::var("ROSTERBOT_MODEL") {
            config.provider.model = model;
        }
        if let Ok(db_path) = std::env::var("ROSTERBOT_DB_PATH") {
            config.database.path = db_path;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".rosterbot")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.memory_window == 0 {
            return Err(ConfigError::ValidationError(
                "agent.memory_window must be at least 1".into(),
            ));
        }

        if self.database.allowed_tables.is_empty() {
            return Err(ConfigError::ValidationError(
                "database.allowed_tables must not be empty".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            database: DatabaseConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider.kind, "ollama");
        assert_eq!(config.database.path, "signups.db");
        assert_eq!(config.agent.memory_window, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.base_url, config.provider.base_url);
        assert_eq!(parsed.database.allowed_tables, config.database.allowed_tables);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[provider]
model = "qwen2.5-coder"

[database]
path = "/tmp/test.db"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.model, "qwen2.5-coder");
        assert_eq!(config.provider.base_url, "http://localhost:11434/v1");
        assert_eq!(config.database.path, "/tmp/test.db");
        assert!(config.database.seed);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            provider: ProviderConfig {
                temperature: 5.0,
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_memory_window_rejected() {
        let config = AppConfig {
            agent: AgentConfig {
                memory_window: 0,
                ..AgentConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_allowed_tables_rejected() {
        let config = AppConfig {
            database: DatabaseConfig {
                allowed_tables: vec![],
                ..DatabaseConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().provider.kind, "ollama");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[provider]
kind = "openai"
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider.kind, "openai");
        assert_eq!(config.provider.model, "gpt-4o-mini");
    }

    #[test]
    fn api_key_redacted_in_debug() {
        let config = AppConfig {
            provider: ProviderConfig {
                api_key: Some("sk-secret-key".into()),
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
