//! Vector embedding abstraction layer.
//!
//! The memory stores rank records by cosine similarity between embeddings.
//! The default provider is a deterministic feature-hashing bag of words,
//! which needs no model files and gives stable results in tests. With the
//! `onnx` feature, [`OnnxEmbeddingProvider`] runs `all-MiniLM-L6-v2`
//! through `fastembed`. Select one with `memory.embedding_provider`.

use std::sync::Arc;

use crate::config::MemoryConfig;
use crate::error::{KindredError, Result};
use crate::types::Embedding;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Generate vector embeddings from text.
///
/// Implementations must be `Send + Sync` so a store can be shared across
/// tasks.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string.
    ///
    /// Returns a vector of `dimensions()` floats.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::Serialization`] if the model fails to
    /// produce an embedding.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Embed a batch of texts.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding in the batch fails.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A human-readable name for the model.
    fn model_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Cosine similarity
// ---------------------------------------------------------------------------

/// Compute the cosine similarity between two embedding vectors.
///
/// Returns a value in \[-1.0, 1.0\], or `0.0` if the lengths differ or
/// either vector has zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    if a.0.len() != b.0.len() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut mag_a = 0.0_f32;
    let mut mag_b = 0.0_f32;

    for (x, y) in a.0.iter().zip(b.0.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

// ---------------------------------------------------------------------------
// Hashing provider
// ---------------------------------------------------------------------------

/// Words too common to say anything about a memory.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "by", "for", "i", "in", "is", "it", "me", "my", "of",
    "on", "or", "so", "that", "the", "this", "to", "was", "we", "with", "you",
];

/// Deterministic bag-of-words embedding via feature hashing.
///
/// Every non-stop-word token is hashed (FNV-1a) into one of `dims`
/// buckets; the resulting count vector is L2-normalised. All components
/// are non-negative, so similarities fall in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dims: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider with the given dimensionality (at least 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dims: dimensions.max(1),
        }
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingProvider for HashingEmbeddingProvider {
    #[allow(clippy::cast_possible_truncation)]
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut v = vec![0.0_f32; self.dims];
        for token in tokenize(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dims as u64) as usize;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(Embedding(v))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        "hashing-bag-of-words"
    }
}

/// Lowercase alphanumeric tokens with stop words removed.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(PRIME)
    })
}

// ---------------------------------------------------------------------------
// ONNX provider
// ---------------------------------------------------------------------------

/// Sentence embeddings from `all-MiniLM-L6-v2` (384 dimensions) via
/// `fastembed`. The model is downloaded to `cache_dir` on first use.
#[cfg(feature = "onnx")]
pub struct OnnxEmbeddingProvider {
    model: parking_lot::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "onnx")]
impl OnnxEmbeddingProvider {
    /// Output dimensionality of `all-MiniLM-L6-v2`.
    pub const DIMENSIONS: usize = 384;

    /// Load the model, using `cache_dir` for model files when given.
    ///
    /// # Errors
    ///
    /// Returns [`KindredError::Config`] if the model cannot be fetched or
    /// initialised.
    pub fn new(cache_dir: Option<&std::path::Path>) -> Result<Self> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir.to_path_buf());
        }
        let model = TextEmbedding::try_new(options)
            .map_err(|e| KindredError::Config(format!("failed to load ONNX embedder: {e}")))?;
        tracing::info!(model = "all-MiniLM-L6-v2", "ONNX embedding provider ready");
        Ok(Self {
            model: parking_lot::Mutex::new(model),
        })
    }
}

#[cfg(feature = "onnx")]
impl std::fmt::Debug for OnnxEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingProvider")
            .field("model", &"all-MiniLM-L6-v2")
            .finish()
    }
}

#[cfg(feature = "onnx")]
impl EmbeddingProvider for OnnxEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| KindredError::Serialization("embedder returned no vector".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let vectors = self
            .model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| KindredError::Serialization(format!("embedding failed: {e}")))?;
        Ok(vectors.into_iter().map(Embedding).collect())
    }

    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }

    fn model_name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Build the provider named by `config.embedding_provider`.
///
/// # Errors
///
/// Returns [`KindredError::InvalidConfig`] for an unknown provider, or for
/// `onnx` in a build without the `onnx` feature; model load failures are
/// passed through.
pub fn provider_from_config(config: &MemoryConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.embedding_provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbeddingProvider::new(
            config.embedding_dimensions,
        ))),
        #[cfg(feature = "onnx")]
        "onnx" => Ok(Arc::new(OnnxEmbeddingProvider::new(None)?)),
        #[cfg(not(feature = "onnx"))]
        "onnx" => Err(KindredError::InvalidConfig {
            field: "memory.embedding_provider".into(),
            reason: "built without the `onnx` feature".into(),
        }),
        other => Err(KindredError::InvalidConfig {
            field: "memory.embedding_provider".into(),
            reason: format!("unknown provider '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_is_identical_embedding() {
        let p = HashingEmbeddingProvider::new(64);
        let a = p.embed("explore the deep forest").expect("embed");
        let b = p.embed("explore the deep forest").expect("embed");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn overlap_beats_disjoint() {
        let p = HashingEmbeddingProvider::default();
        let q = p.embed("explore the forest").expect("embed");
        let near = p.embed("we went to explore a dark forest").expect("embed");
        let far = p.embed("berries taste sweet").expect("embed");
        assert!(cosine_similarity(&q, &near) > cosine_similarity(&q, &far));
    }

    #[test]
    fn empty_text_has_zero_similarity() {
        let p = HashingEmbeddingProvider::new(16);
        let empty = p.embed("").expect("embed");
        let other = p.embed("hello").expect("embed");
        assert!(cosine_similarity(&empty, &other).abs() < f32::EPSILON);
    }

    #[test]
    fn mismatched_dimensions_are_zero() {
        let a = Embedding(vec![1.0, 0.0]);
        let b = Embedding(vec![1.0, 0.0, 0.0]);
        assert!(cosine_similarity(&a, &b).abs() < f32::EPSILON);
    }

    #[test]
    fn tokenize_drops_stop_words_and_punctuation() {
        assert_eq!(tokenize("Let's go to the Lake!"), vec!["let", "s", "go", "lake"]);
    }

    #[test]
    fn fnv_known_vector() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn default_config_selects_hashing() {
        let config = MemoryConfig {
            embedding_dimensions: 32,
            ..MemoryConfig::default()
        };
        let provider = provider_from_config(&config).expect("provider");
        assert_eq!(provider.model_name(), "hashing-bag-of-words");
        assert_eq!(provider.dimensions(), 32);
    }

    #[test]
    fn unknown_provider_is_invalid_config() {
        let config = MemoryConfig {
            embedding_provider: "word2vec".into(),
            ..MemoryConfig::default()
        };
        let err = provider_from_config(&config).err().expect("unknown");
        assert!(matches!(err, KindredError::InvalidConfig { .. }));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_needs_the_feature() {
        let config = MemoryConfig {
            embedding_provider: "onnx".into(),
            ..MemoryConfig::default()
        };
        let err = provider_from_config(&config).err().expect("feature off");
        assert!(err.to_string().contains("onnx"));
    }
}
