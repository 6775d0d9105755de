//! Text-generation error types.

use thiserror::Error;

/// Errors that can occur while talking to a text-generation backend.
///
/// None of these reach the companion: [`crate::TextGenerator`] logs them
/// and answers from the keyword fallback instead.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The backend answered with a body we could not read.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// No backend is configured, or it could not be reached.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// All retry attempts exhausted.
    #[error("All LLM retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// The error from the final attempt.
        last_error: String,
    },

    /// Configuration error, e.g. an unknown provider or a missing API key.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}
