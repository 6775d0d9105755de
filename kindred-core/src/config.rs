//! Configuration for the kindred companion mind.
//!
//! Maps directly to `kindred.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration. The value is
//! built once at startup and handed to each component by reference.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};

/// Tolerance used when checking that agent weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Top-level kindred configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindredConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Memory thresholds and decay.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Agent panel weights.
    #[serde(default)]
    pub council: CouncilConfig,
    /// Text generation backend.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Memory store backend.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl KindredConfig {
    /// Load configuration from a TOML string and validate it.
    ///
    /// # Errors
    /// Returns [`KindredError::Config`] if the TOML is invalid, or
    /// [`KindredError::InvalidConfig`] if a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| KindredError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check every section for values the core cannot work with.
    ///
    /// # Errors
    /// Returns [`KindredError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.memory.validate()?;
        self.council.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Memory gating, retrieval and decay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Minimum significance (0–10) an interaction needs to become a memory.
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f32,
    /// Number of memories returned per retrieval.
    #[serde(default = "default_retrieval_count")]
    pub retrieval_count: usize,
    /// Capacity of the short-term interaction buffer.
    #[serde(default = "default_working_memory_capacity")]
    pub working_memory_capacity: usize,
    /// Strength lost per decay pass by a significance-0 memory.
    #[serde(default = "default_forgetting_rate")]
    pub forgetting_rate: f32,
    /// Seconds between scheduled decay passes.
    #[serde(default = "default_decay_interval_secs")]
    pub decay_interval_secs: u64,
    /// Embedding provider: `hashing`, or `onnx` when built with the
    /// `onnx` feature.
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,
    /// Dimensionality of the hashing embedding provider.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            significance_threshold: default_significance_threshold(),
            retrieval_count: default_retrieval_count(),
            working_memory_capacity: default_working_memory_capacity(),
            forgetting_rate: default_forgetting_rate(),
            decay_interval_secs: default_decay_interval_secs(),
            embedding_provider: default_embedding_provider(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

impl MemoryConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.significance_threshold) {
            return Err(invalid(
                "memory.significance_threshold",
                "must be within [0, 10]",
            ));
        }
        if !(0.0..=1.0).contains(&self.forgetting_rate) {
            return Err(invalid("memory.forgetting_rate", "must be within [0, 1]"));
        }
        if self.retrieval_count == 0 {
            return Err(invalid("memory.retrieval_count", "must be at least 1"));
        }
        if self.working_memory_capacity == 0 {
            return Err(invalid(
                "memory.working_memory_capacity",
                "must be at least 1",
            ));
        }
        if self.embedding_dimensions == 0 {
            return Err(invalid("memory.embedding_dimensions", "must be at least 1"));
        }
        if !matches!(self.embedding_provider.as_str(), "hashing" | "onnx") {
            return Err(invalid(
                "memory.embedding_provider",
                &format!("unknown provider '{}'", self.embedding_provider),
            ));
        }
        Ok(())
    }
}

/// Agent panel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Static base weight per agent. Must sum to 1.0.
    #[serde(default)]
    pub weights: AgentWeights,
    /// Context-driven weight overrides.
    #[serde(default)]
    pub modulation: WeightModulation,
}

impl CouncilConfig {
    fn validate(&self) -> Result<()> {
        let w = &self.weights;
        let all = [w.logic, w.survival, w.recall, w.needs, w.instinct];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid(
                "council.weights",
                "weights must be finite and non-negative",
            ));
        }
        let sum: f32 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(invalid(
                "council.weights",
                &format!("weights must sum to 1.0 (got {sum:.3})"),
            ));
        }
        let m = &self.modulation;
        let overrides = [
            m.survival_danger_weight,
            m.survival_injured_weight,
            m.needs_urgent_weight,
            m.needs_mild_weight,
        ];
        if overrides.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(invalid(
                "council.modulation",
                "override weights must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Base weight per agent kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentWeights {
    /// Logic and planning.
    #[serde(default = "default_logic_weight")]
    pub logic: f32,
    /// Emotion and survival.
    #[serde(default = "default_survival_weight")]
    pub survival: f32,
    /// Past experience.
    #[serde(default = "default_recall_weight")]
    pub recall: f32,
    /// Bodily needs.
    #[serde(default = "default_needs_weight")]
    pub needs: f32,
    /// Reflexes and instinct.
    #[serde(default = "default_instinct_weight")]
    pub instinct: f32,
}

impl Default for AgentWeights {
    fn default() -> Self {
        Self {
            logic: default_logic_weight(),
            survival: default_survival_weight(),
            recall: default_recall_weight(),
            needs: default_needs_weight(),
            instinct: default_instinct_weight(),
        }
    }
}

/// Weights that replace an agent's base weight under stress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightModulation {
    /// Survival weight when the location is unsafe.
    #[serde(default = "default_survival_danger_weight")]
    pub survival_danger_weight: f32,
    /// Survival weight when health is critically low.
    #[serde(default = "default_survival_injured_weight")]
    pub survival_injured_weight: f32,
    /// Needs weight when starving or exhausted.
    #[serde(default = "default_needs_urgent_weight")]
    pub needs_urgent_weight: f32,
    /// Needs weight for milder hunger or fatigue.
    #[serde(default = "default_needs_mild_weight")]
    pub needs_mild_weight: f32,
}

impl Default for WeightModulation {
    fn default() -> Self {
        Self {
            survival_danger_weight: default_survival_danger_weight(),
            survival_injured_weight: default_survival_injured_weight(),
            needs_urgent_weight: default_needs_urgent_weight(),
            needs_mild_weight: default_needs_mild_weight(),
        }
    }
}

/// Text generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "none", "openai" or "ollama".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL of the backend.
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    /// Model name sent with each request.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Environment variable that holds the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Token budget per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_llm_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

/// Memory store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Backend: "memory" or "sqlite".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Database file used by the SQLite backend.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Store and verify a CRC-32 of each record.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_db_path(),
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

fn invalid(field: &str, reason: &str) -> KindredError {
    KindredError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> String { "none".to_string() }
fn default_llm_url() -> String { "https://api.openai.com".to_string() }
fn default_llm_model() -> String { "gpt-4o-mini".to_string() }
fn default_api_key_env() -> String { "KINDRED_API_KEY".to_string() }
fn default_backend() -> String { "memory".to_string() }
fn default_db_path() -> String { "kindred_memory.db".to_string() }
fn default_significance_threshold() -> f32 { 6.0 }
fn default_retrieval_count() -> usize { 5 }
fn default_working_memory_capacity() -> usize { 10 }
fn default_forgetting_rate() -> f32 { 0.01 }
fn default_decay_interval_secs() -> u64 { 3600 }
fn default_embedding_provider() -> String { "hashing".to_string() }
fn default_embedding_dimensions() -> usize { 256 }
fn default_logic_weight() -> f32 { 0.25 }
fn default_survival_weight() -> f32 { 0.30 }
fn default_recall_weight() -> f32 { 0.20 }
fn default_needs_weight() -> f32 { 0.15 }
fn default_instinct_weight() -> f32 { 0.10 }
fn default_survival_danger_weight() -> f32 { 0.60 }
fn default_survival_injured_weight() -> f32 { 0.50 }
fn default_needs_urgent_weight() -> f32 { 0.35 }
fn default_needs_mild_weight() -> f32 { 0.25 }
fn default_max_tokens() -> u32 { 150 }
fn default_temperature() -> f32 { 0.8 }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_retries() -> u32 { 1 }
