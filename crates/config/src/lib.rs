//! Configuration loading, validation, and management for Tether.
//!
//! Loads configuration from `~/.tether/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tether_core::GenerationParams;
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `~/.tether/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Persona preamble sent as the wire system turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Completion gateway configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Retrieval gateway configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Conversation history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_completion_url")]
    pub base_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Search endpoint URL. When unset, the in-process index is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// How many documents each retrieval call asks for
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum retained user/assistant turns per session
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_completion_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_temperature() -> f32 {
    0.0
}
fn default_top_p() -> f32 {
    0.9
}
fn default_top_k() -> usize {
    4
}
fn default_max_turns() -> usize {
    tether_core::DEFAULT_MAX_TURNS
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            top_k: default_top_k(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            system_prompt: None,
            completion: CompletionConfig::default(),
            retrieval: RetrievalConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("system_prompt", &self.system_prompt)
            .field("completion", &self.completion)
            .field("retrieval", &self.retrieval)
            .field("history", &self.history)
            .finish()
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl AppConfig {
    /// Load configuration from the default path (~/.tether/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TETHER_API_KEY` (highest priority), `OPENROUTER_API_KEY`,
    ///   `OPENAI_API_KEY`
    /// - `TETHER_MODEL`, `TETHER_COMPLETION_URL`, `TETHER_RETRIEVAL_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("TETHER_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("TETHER_MODEL") {
            config.completion.model = model;
        }

        if let Ok(url) = std::env::var("TETHER_COMPLETION_URL") {
            config.completion.base_url = url;
        }

        if let Ok(url) = std::env::var("TETHER_RETRIEVAL_URL") {
            config.retrieval.base_url = Some(url);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tether")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.temperature < 0.0 || self.completion.temperature > 2.0 {
            return Err(ConfigError::Validation(
                "completion.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.completion.top_p <= 0.0 || self.completion.top_p > 1.0 {
            return Err(ConfigError::Validation(
                "completion.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Validation(
                "retrieval.top_k must be at least 1".into(),
            ));
        }

        if self.history.max_turns < 2 || self.history.max_turns % 2 != 0 {
            return Err(ConfigError::Validation(
                "history.max_turns must be an even number of at least 2".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generation parameters for completion requests.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.completion.max_tokens,
            temperature: self.completion.temperature,
            top_p: self.completion.top_p,
            stop: Vec::new(),
        }
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.completion.max_tokens, 2000);
        assert!(config.completion.temperature.abs() < f32::EPSILON);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.history.max_turns, 20);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.completion.model, default_model());
    }

    #[test]
    fn loads_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[completion]\nmodel = \"gpt-4o-mini\"\n\n[history]\nmax_turns = 12"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.history.max_turns, 12);
        // Unspecified sections fall back to defaults
        assert_eq!(config.retrieval.top_k, 4);
    }

    #[test]
    fn rejects_bad_temperature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[completion]\ntemperature = 3.5").unwrap();

        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_odd_max_turns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[history]\nmax_turns = 7").unwrap();

        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_turns"));
    }

    #[test]
    fn rejects_zero_top_k() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 0").unwrap();

        assert!(AppConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-or-v1-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        assert!(config.validate().is_ok());
    }
}
