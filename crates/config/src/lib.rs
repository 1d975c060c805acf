//! Configuration loading, validation, and management for chatwindow.
//!
//! Loads configuration from `~/.chatwindow/config.toml` with environment
//! variable overrides. The memory store never reads configuration itself:
//! callers load it here and pass the resulting [`MemoryConfig`] in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.chatwindow/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Token budget configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Token budget settings for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Context window of the target model, prompt and reply together
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Tokens always kept free for the model's reply
    #[serde(default = "default_minimum_reply_tokens")]
    pub minimum_reply_tokens: usize,

    /// Maximum history messages per prompt (0 = unlimited)
    #[serde(default)]
    pub max_history_messages: usize,

    /// Tokenizer used for cost accounting
    #[serde(default)]
    pub encoder: EncoderKind,
}

fn default_max_tokens() -> usize {
    4096
}
fn default_minimum_reply_tokens() -> usize {
    1024
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            minimum_reply_tokens: default_minimum_reply_tokens(),
            max_history_messages: 0,
            encoder: EncoderKind::default(),
        }
    }
}

impl MemoryConfig {
    /// Non-fatal problems. An ill-formed budget still assembles (the lower
    /// tiers just stay empty), so these are reported rather than rejected.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.minimum_reply_tokens >= self.max_tokens {
            warnings.push(format!(
                "minimum_reply_tokens ({}) leaves no prompt budget within max_tokens ({})",
                self.minimum_reply_tokens, self.max_tokens
            ));
        }
        warnings
    }
}

/// Which tokenizer counts tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// GPT-3.5 / GPT-4 BPE
    #[default]
    Cl100kBase,
    /// GPT-4o BPE
    O200kBase,
    /// ~4 characters per token
    Heuristic,
    /// One token per byte (upper bound)
    Bytes,
}

impl EncoderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
            Self::Heuristic => "heuristic",
            Self::Bytes => "bytes",
        }
    }
}

impl std::fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncoderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cl100k_base" | "cl100k" => Ok(Self::Cl100kBase),
            "o200k_base" | "o200k" => Ok(Self::O200kBase),
            "heuristic" => Ok(Self::Heuristic),
            "bytes" => Ok(Self::Bytes),
            other => Err(ConfigError::ValidationError(format!(
                "unknown encoder '{other}'"
            ))),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatwindow/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CHATWINDOW_MAX_TOKENS`
    /// - `CHATWINDOW_MIN_REPLY_TOKENS`
    /// - `CHATWINDOW_MAX_HISTORY_MESSAGES`
    /// - `CHATWINDOW_ENCODER`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply overrides from `lookup` (the process environment in [`AppConfig::load`]).
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn number(key: &str, value: Option<String>) -> Option<usize> {
            let value = value?;
            match value.trim().parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    tracing::warn!("Ignoring {key}={value}: not a non-negative integer");
                    None
                }
            }
        }

        if let Some(n) = number("CHATWINDOW_MAX_TOKENS", lookup("CHATWINDOW_MAX_TOKENS")) {
            self.memory.max_tokens = n;
        }
        if let Some(n) = number(
            "CHATWINDOW_MIN_REPLY_TOKENS",
            lookup("CHATWINDOW_MIN_REPLY_TOKENS"),
        ) {
            self.memory.minimum_reply_tokens = n;
        }
        if let Some(n) = number(
            "CHATWINDOW_MAX_HISTORY_MESSAGES",
            lookup("CHATWINDOW_MAX_HISTORY_MESSAGES"),
        ) {
            self.memory.max_history_messages = n;
        }
        if let Some(value) = lookup("CHATWINDOW_ENCODER") {
            match value.parse() {
                Ok(kind) => self.memory.encoder = kind,
                Err(e) => tracing::warn!("Ignoring CHATWINDOW_ENCODER: {e}"),
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatwindow")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_tokens must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
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
