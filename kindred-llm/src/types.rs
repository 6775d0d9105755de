//! Core types for generation requests and responses.

use serde::{Deserialize, Serialize};

/// Default token budget for a companion reply.
pub const DEFAULT_MAX_TOKENS: u32 = 150;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
/// Default request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// A request for one completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Optional persona or instructions, sent as a system message.
    pub system: Option<String>,
    /// The prompt proper.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Sequences that end generation early. Omitted from the payload when empty.
    pub stop: Vec<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Text the keyword fallback matches against instead of the prompt.
    /// Never sent to a backend.
    #[serde(skip)]
    pub fallback_key: Option<String>,
}

impl GenerationRequest {
    /// A request with default sampling settings.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            stop: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fallback_key: None,
        }
    }

    /// Set the system message.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = (!system.trim().is_empty()).then_some(system);
        self
    }

    /// Set the token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the stop sequences.
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Match the keyword fallback against `key` rather than the full prompt.
    #[must_use]
    pub fn with_fallback_key(mut self, key: impl Into<String>) -> Self {
        self.fallback_key = Some(key.into());
        self
    }

    /// What the keyword fallback should read.
    #[must_use]
    pub fn fallback_text(&self) -> &str {
        self.fallback_key.as_deref().unwrap_or(&self.prompt)
    }
}

/// A completion returned by a backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationResponse {
    /// The generated text, trimmed.
    pub text: String,
    /// How many tokens were generated, when the backend reports it.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Which model answered.
    pub model: String,
}

/// Where a piece of generated text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// A configured backend produced it.
    Model,
    /// The keyword fallback produced it.
    Fallback,
}

/// Text plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    /// The text to show.
    pub text: String,
    /// Who wrote it.
    pub source: TextSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_system_message_is_dropped() {
        let req = GenerationRequest::new("hi").with_system("   ");
        assert!(req.system.is_none());
        let req = GenerationRequest::new("hi").with_system("You are kind.");
        assert_eq!(req.system.as_deref(), Some("You are kind."));
    }

    #[test]
    fn builders_override_defaults() {
        let req = GenerationRequest::new("hi")
            .with_max_tokens(100)
            .with_temperature(0.85)
            .with_stop(vec!["\n\n".into()])
            .with_timeout(500);
        assert_eq!(req.max_tokens, 100);
        assert!((req.temperature - 0.85).abs() < f32::EPSILON);
        assert_eq!(req.stop, vec!["\n\n".to_string()]);
        assert_eq!(req.timeout_ms, 500);
    }

    #[test]
    fn fallback_reads_the_key_when_set() {
        let req = GenerationRequest::new("Recent conversation:\n- Trainer: hello");
        assert_eq!(req.fallback_text(), req.prompt);
        let req = req.with_fallback_key("time for a nap");
        assert_eq!(req.fallback_text(), "time for a nap");
    }
}
