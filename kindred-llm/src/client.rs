//! LLM Client — unified interface for OpenAI-compatible and Ollama backends.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::types::{GenerationRequest, GenerationResponse};

/// Provider backend for text generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API.
    OpenAiCompatible {
        /// Base URL without the `/v1/...` suffix.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// Ollama running locally.
    Ollama {
        /// Base URL without the `/api/...` suffix.
        base_url: String,
    },
    /// No backend; every call fails and the caller falls back.
    None,
}

impl LlmProvider {
    /// Build a provider from its configured name.
    ///
    /// `api_key` is only consulted for `"openai"`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigError`] for an unknown provider name or an
    /// `"openai"` provider without a key.
    pub fn resolve(
        kind: &str,
        base_url: &str,
        api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        match kind.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama { base_url }),
            "openai" => match api_key.filter(|k| !k.trim().is_empty()) {
                Some(api_key) => Ok(Self::OpenAiCompatible { base_url, api_key }),
                None => Err(LlmError::ConfigError(
                    "openai provider configured without an API key".into(),
                )),
            },
            other => Err(LlmError::ConfigError(format!("unknown provider '{other}'"))),
        }
    }
}

/// The HTTP client that routes requests to the configured backend.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client with no backend (all calls fail, triggering the fallback).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// The configured provider.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Check if the client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a completion.
    ///
    /// # Errors
    ///
    /// Returns `Err` if no backend is configured or all retries fail. The
    /// caller should fall back to canned text on error.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let body = self.openai_body(request);
                self.send_with_retries(&url, &body, Some(api_key), request.timeout_ms, openai_text)
                    .await
            }
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = self.ollama_body(request);
                self.send_with_retries(&url, &body, None, request.timeout_ms, ollama_text)
                    .await
            }
        }
    }

    fn openai_body(&self, request: &GenerationRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if !request.stop.is_empty() {
            body["stop"] = json!(request.stop);
        }
        body
    }

    fn ollama_body(&self, request: &GenerationRequest) -> Value {
        let prompt = match &request.system {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        };
        let mut body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });
        if !request.stop.is_empty() {
            body["options"]["stop"] = json!(request.stop);
        }
        body
    }

    async fn send_with_retries(
        &self,
        url: &str,
        body: &Value,
        bearer: Option<&str>,
        timeout_ms: u64,
        extract: fn(&Value) -> Option<(String, u32)>,
    ) -> Result<GenerationResponse, LlmError> {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(
                    attempt = attempt + 1,
                    of = self.max_retries + 1,
                    url,
                    "Retrying LLM call"
                );
            }

            let start = Instant::now();
            let mut call = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(timeout_ms));
            if let Some(key) = bearer {
                call = call.bearer_auth(key);
            }
            let result = call.send().await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    let (text, tokens_generated) = extract(&json).ok_or_else(|| {
                        LlmError::ParseError(format!("unexpected response format: {json}"))
                    })?;
                    debug!(latency_ms, tokens_generated, "LLM call succeeded");
                    return Ok(GenerationResponse {
                        text,
                        tokens_generated,
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Ok(resp) => {
                    last_error = format!("HTTP {}", resp.status());
                    warn!(url, error = %last_error, "LLM backend returned error");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!(url, timeout_ms, "LLM request timed out");
                    } else {
                        warn!(url, error = %last_error, "LLM request failed");
                    }
                }
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Pull the completion out of an OpenAI-style body.
///
/// Accepts chat completions (`choices[0].message.content`), legacy
/// completions (`choices[0].text`) and bare `{"text": ...}` bodies.
#[must_use]
pub fn openai_text(json: &Value) -> Option<(String, u32)> {
    let choice = &json["choices"][0];
    let text = choice["message"]["content"]
        .as_str()
        .or_else(|| choice["text"].as_str())
        .or_else(|| json["text"].as_str())?;
    let tokens = json["usage"]["completion_tokens"].as_u64().unwrap_or(0);
    Some((text.trim().to_string(), u32::try_from(tokens).unwrap_or(u32::MAX)))
}

/// Pull the completion out of an Ollama `/api/generate` body.
#[must_use]
pub fn ollama_text(json: &Value) -> Option<(String, u32)> {
    let text = json["response"].as_str()?;
    let tokens = json["eval_count"].as_u64().unwrap_or(0);
    Some((text.trim().to_string(), u32::try_from(tokens).unwrap_or(u32::MAX)))
}
