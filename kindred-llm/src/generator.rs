//! A generator that always produces text.
//!
//! Wraps [`LlmClient`]; any failure, and any empty completion, is logged
//! and answered from [`fallback_response`], keyed on the request's
//! fallback key when it has one.

use tracing::{info, warn};

use crate::client::LlmClient;
use crate::fallback::fallback_response;
use crate::types::{GeneratedText, GenerationRequest, TextSource};

/// Never-failing text generation.
#[derive(Debug, Clone)]
pub struct TextGenerator {
    client: LlmClient,
    max_tokens: u32,
    temperature: f32,
    timeout_ms: u64,
}

impl TextGenerator {
    /// Wrap `client` with default sampling settings.
    #[must_use]
    pub fn new(client: LlmClient, max_tokens: u32, temperature: f32, timeout_ms: u64) -> Self {
        Self {
            client,
            max_tokens,
            temperature,
            timeout_ms,
        }
    }

    /// A generator that only ever answers from the fallback.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(
            LlmClient::none(),
            crate::types::DEFAULT_MAX_TOKENS,
            crate::types::DEFAULT_TEMPERATURE,
            crate::types::DEFAULT_TIMEOUT_MS,
        )
    }

    /// The wrapped client.
    #[must_use]
    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    /// Generate text for `prompt`. `None` settings use the generator's defaults.
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        stop: &[String],
    ) -> String {
        let request = GenerationRequest::new(prompt)
            .with_max_tokens(max_tokens.unwrap_or(self.max_tokens))
            .with_temperature(temperature.unwrap_or(self.temperature))
            .with_stop(stop.to_vec())
            .with_timeout(self.timeout_ms);
        self.generate_request(&request).await.text
    }

    /// Generate text for a fully specified request, reporting where it came from.
    pub async fn generate_request(&self, request: &GenerationRequest) -> GeneratedText {
        if !self.client.is_available() {
            info!("No LLM backend configured, using fallback response");
            return Self::fallback(request);
        }

        match self.client.generate(request).await {
            Ok(resp) if !resp.text.is_empty() => GeneratedText {
                text: resp.text,
                source: TextSource::Model,
            },
            Ok(resp) => {
                warn!(model = %resp.model, "LLM returned empty text, using fallback response");
                Self::fallback(request)
            }
            Err(e) => {
                warn!(error = %e, "LLM generation failed, using fallback response");
                Self::fallback(request)
            }
        }
    }

    fn fallback(request: &GenerationRequest) -> GeneratedText {
        GeneratedText {
            text: fallback_response(request.fallback_text()).to_string(),
            source: TextSource::Fallback,
        }
    }
}

impl Default for TextGenerator {
    fn default() -> Self {
        Self::offline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmProvider;

    #[tokio::test]
    async fn offline_generator_answers_from_fallback() {
        let generator = TextGenerator::offline();
        let text = generator.generate("Hello friend", None, None, &[]).await;
        assert_eq!(text, fallback_response("hello"));
    }

    #[tokio::test]
    async fn unreachable_backend_falls_back() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .expect("bind")
            .local_addr()
            .expect("addr")
            .port();
        let client = LlmClient::new(
            LlmProvider::Ollama {
                base_url: format!("http://127.0.0.1:{port}"),
            },
            "tiny",
            1,
        );
        let generator = TextGenerator::new(client, 20, 0.5, 500);
        let out = generator
            .generate_request(&GenerationRequest::new("time for a nap").with_timeout(500))
            .await;
        assert_eq!(out.source, TextSource::Fallback);
        assert_eq!(out.text, fallback_response("nap"));
    }

    #[tokio::test]
    async fn fallback_ignores_prompt_history() {
        let generator = TextGenerator::offline();
        let request = GenerationRequest::new(
            "Recent conversation:\n- Trainer: hello\n\nTrainer says: time for a nap",
        )
        .with_fallback_key("time for a nap");
        let out = generator.generate_request(&request).await;
        assert_eq!(out.source, TextSource::Fallback);
        assert_eq!(out.text, fallback_response("nap"));
    }
}
