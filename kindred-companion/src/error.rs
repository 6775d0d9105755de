//! Companion error types.

use thiserror::Error;

use kindred_core::KindredError;
use kindred_llm::LlmError;

/// Errors surfaced by a companion session.
#[derive(Debug, Error)]
pub enum CompanionError {
    /// The mind itself failed (empty panel, bad configuration, storage).
    #[error(transparent)]
    Core(#[from] KindredError),

    /// A prompt could not be prepared.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The logging subscriber could not be installed.
    #[error("Failed to initialise tracing: {0}")]
    Telemetry(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CompanionError>;
