//! Error types for the Simplo domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Exchange failures are classified so callers can react per kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for all Simplo operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Exchange errors ---
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure of a single conversation exchange.
#[derive(Debug, Clone, Error)]
pub enum ExchangeError {
    /// The caller supplied a malformed or empty history. Nothing was sent.
    #[error("Invalid conversation input: {0}")]
    Input(String),

    /// The HTTP exchange itself could not complete.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("Upstream error (status: {status}): {payload}")]
    Upstream {
        status: u16,
        payload: UpstreamPayload,
    },

    /// The provider answered 2xx but the body lacks the completion shape.
    #[error("Upstream response violated the chat-completion contract: {0}")]
    ContractViolation(String),
}

impl ExchangeError {
    /// The classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::ContractViolation(_) => ErrorKind::ContractViolation,
        }
    }
}

/// An upstream error body: parsed JSON when possible, otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamPayload {
    Json(serde_json::Value),
    Text(String),
}

impl UpstreamPayload {
    /// Parse a response body, falling back to the raw text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body.to_string()),
        }
    }

    /// Multi-line rendering for display to a person.
    pub fn to_pretty_string(&self) -> String {
        match self {
            Self::Json(serde_json::Value::String(s)) => s.clone(),
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Text(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for UpstreamPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Stable names for failure classes, shared by every surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    Transport,
    Upstream,
    ContractViolation,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Transport => "transport",
            Self::Upstream => "upstream",
            Self::ContractViolation => "contract_violation",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
