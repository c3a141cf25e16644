//! Configuration loading, validation, and management for Simplo.
//!
//! Loads configuration from `~/.simplo/config.toml` with environment
//! variable overrides. Validates all settings at startup; a missing
//! credential is reported before any conversation begins.

use serde::{Deserialize, Serialize};
use simplo_core::ErrorKind;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.simplo/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer credential for the upstream endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Sampling temperature sent with every request
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Text and vision model identifiers
    #[serde(default)]
    pub models: ModelsConfig,

    /// System instructions and the image placeholder
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_api_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
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
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("models", &self.models)
            .field("prompts", &self.prompts)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Used while no turn in the conversation carries an image
    #[serde(default = "default_text_model")]
    pub text: String,

    /// Used once any turn carries an image
    #[serde(default = "default_vision_model")]
    pub vision: String,
}

fn default_text_model() -> String {
    "deepseek/deepseek-r1-0528:free".into()
}
fn default_vision_model() -> String {
    "openai/gpt-4o-mini".into()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text: default_text_model(),
            vision: default_vision_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default = "default_text_system")]
    pub text_system: String,

    #[serde(default = "default_vision_system")]
    pub vision_system: String,

    /// Sent as the text part of an image turn that has no text
    #[serde(default = "default_image_placeholder")]
    pub image_placeholder: String,
}

fn default_text_system() -> String {
    "You are a helpful AI assistant. Always respond in English, regardless of the language \
     used in the user's message. Be friendly, helpful, and conversational."
        .into()
}
fn default_vision_system() -> String {
    "You are a helpful AI assistant with vision capabilities. When you see an image, describe \
     what you observe in detail. Be friendly, helpful, and conversational. Always respond in \
     English."
        .into()
}
fn default_image_placeholder() -> String {
    "Please describe this image.".into()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            text_system: default_text_system(),
            vision_system: default_vision_system(),
            image_placeholder: default_image_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.simplo/config.toml).
    ///
    /// Environment variables:
    /// - `SIMPLO_API_KEY`, then `OPENROUTER_API_KEY` (when the file sets no key)
    /// - `SIMPLO_API_URL`, `SIMPLO_TEXT_MODEL`, `SIMPLO_VISION_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
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

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = non_empty("SIMPLO_API_KEY").or_else(|| non_empty("OPENROUTER_API_KEY"));
        }
        if let Some(url) = non_empty("SIMPLO_API_URL") {
            self.api_url = url;
        }
        if let Some(model) = non_empty("SIMPLO_TEXT_MODEL") {
            self.models.text = model;
        }
        if let Some(model) = non_empty("SIMPLO_VISION_MODEL") {
            self.models.vision = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".simplo")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }

        if self.models.text.trim().is_empty() || self.models.vision.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "models.text and models.vision must be non-empty".into(),
            ));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        Ok(())
    }

    /// The upstream credential, or a startup-fatal error when absent.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            models: ModelsConfig::default(),
            prompts: PromptsConfig::default(),
            gateway: GatewayConfig::default(),
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

    #[error("No API key configured: set SIMPLO_API_KEY or OPENROUTER_API_KEY, or api_key in config.toml")]
    MissingApiKey,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

impl From<ConfigError> for simplo_core::Error {
    fn from(err: ConfigError) -> Self {
        simplo_core::Error::Config {
            message: err.to_string(),
        }
    }
}
