// src/error.rs
// Error types for the translator core

use thiserror::Error;

/// Main error type for the translator library
#[derive(Error, Debug)]
pub enum TranslatorError {
    /// No valid language-model credential is bound
    #[error("not connected: no valid API key is bound")]
    NotConnected,

    /// A required field was absent from a parsed model reply
    #[error("missing field '{0}' in model reply")]
    MissingField(String),

    #[error("localization count mismatch: expected {expected} lines, got {actual}")]
    LocalizationCountMismatch { expected: usize, actual: usize },

    /// Opaque failure reported by a provider
    #[error("provider error: {0}")]
    Provider(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task cancelled")]
    Cancelled,
}

/// Convenience type alias for Result using TranslatorError
pub type Result<T> = std::result::Result<T, TranslatorError>;

impl TranslatorError {
    /// Wrap a provider-side failure, keeping the full context chain
    pub fn provider(err: anyhow::Error) -> Self {
        TranslatorError::Provider(format!("{:#}", err))
    }

    /// Text shown on the result surface in place of a translation
    pub fn to_user_string(&self) -> String {
        match self {
            TranslatorError::NotConnected => "Not connected: set an API key with :key <api-key>".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for TranslatorError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            TranslatorError::Cancelled
        } else {
            TranslatorError::Provider(err.to_string())
        }
    }
}

impl From<TranslatorError> for String {
    fn from(err: TranslatorError) -> Self {
        err.to_string()
    }
}
