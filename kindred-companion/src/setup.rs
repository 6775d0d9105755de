//! Building the collaborators a session needs from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use kindred_core::config::{KindredConfig, LlmConfig};
use kindred_core::embedding::provider_from_config;
use kindred_core::store::{InMemoryStore, MemoryStore, SqliteMemoryStore};
use kindred_core::KindredError;
use kindred_llm::{LlmClient, LlmProvider, TextGenerator};

/// Open the memory store named by `config.persistence.backend`.
///
/// # Errors
///
/// Returns [`KindredError::InvalidConfig`] for an unknown backend or
/// embedding provider, or the store's own error if the database cannot be
/// opened.
pub fn open_store(config: &KindredConfig) -> Result<Arc<dyn MemoryStore>, KindredError> {
    let embedder = provider_from_config(&config.memory)?;
    let persistence = &config.persistence;

    match persistence.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new(embedder))),
        "sqlite" => {
            let store = SqliteMemoryStore::open(&persistence.path, persistence, embedder)?;
            Ok(Arc::new(store))
        }
        other => Err(KindredError::InvalidConfig {
            field: "persistence.backend".into(),
            reason: format!("unknown backend '{other}', expected 'memory' or 'sqlite'"),
        }),
    }
}

/// Build a generator for the configured backend.
///
/// The API key is read from the environment variable named by
/// `config.api_key_env`. A missing key or unknown provider is not fatal:
/// the generator answers from its fallback instead.
#[must_use]
pub fn build_generator(config: &LlmConfig) -> TextGenerator {
    let api_key = std::env::var(&config.api_key_env).ok();
    let client = match LlmProvider::resolve(&config.provider, &config.base_url, api_key) {
        Ok(provider) => {
            info!(provider = %config.provider, model = %config.model, "Text generation configured");
            LlmClient::new(provider, config.model.clone(), config.max_retries)
        }
        Err(e) => {
            warn!(error = %e, "Text generation unavailable, replies will use fallback text");
            LlmClient::none()
        }
    };
    TextGenerator::new(client, config.max_tokens, config.temperature, config.timeout_ms)
}
