//! In-process memory store.
//!
//! Records live in per-type maps behind a single `RwLock`. Queries take the
//! read lock and rank by brute-force cosine similarity; every mutation takes
//! the write lock, which serialises decay passes against retrieval updates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::embedding::{EmbeddingProvider, HashingEmbeddingProvider, cosine_similarity};
use crate::error::Result;
use crate::memory::{MemoryRecord, MemoryType};
use crate::store::{MemoryHit, MemoryStore, MemoryUpdate, rank_hits};
use crate::types::{Embedding, Emotion, MemoryId};

struct Stored {
    record: MemoryRecord,
    embedding: Embedding,
}

type Collections = HashMap<MemoryType, BTreeMap<MemoryId, Stored>>;

/// A [`MemoryStore`] held entirely in memory.
pub struct InMemoryStore {
    collections: RwLock<Collections>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total: usize = self.collections.read().values().map(BTreeMap::len).sum();
        f.debug_struct("InMemoryStore")
            .field("records", &total)
            .field("model", &self.embedder.model_name())
            .finish()
    }
}

impl InMemoryStore {
    /// Create an empty store using the given embedding provider.
    #[must_use]
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    fn query_filtered<F>(&self, text: &str, k: usize, keep: F) -> Result<Vec<MemoryHit>>
    where
        F: Fn(&MemoryRecord) -> bool,
    {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(text)?;
        let guard = self.collections.read();
        let hits = guard
            .values()
            .flat_map(BTreeMap::values)
            .filter(|s| keep(&s.record))
            .map(|s| MemoryHit {
                record: s.record.clone(),
                similarity: cosine_similarity(&query, &s.embedding),
            })
            .collect();
        Ok(rank_hits(hits, k))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(HashingEmbeddingProvider::default()))
    }
}

impl MemoryStore for InMemoryStore {
    fn store(&self, record: &MemoryRecord) -> Result<()> {
        let embedding = self.embedder.embed(&record.content)?;
        let memory_type = record.memory_type();
        self.collections.write().entry(memory_type).or_default().insert(
            record.id,
            Stored {
                record: record.clone(),
                embedding,
            },
        );
        debug!(memory = %record.id, memory_type = %memory_type, "Stored memory");
        Ok(())
    }

    fn get(&self, id: MemoryId, memory_type: MemoryType) -> Result<Option<MemoryRecord>> {
        Ok(self
            .collections
            .read()
            .get(&memory_type)
            .and_then(|c| c.get(&id))
            .map(|s| s.record.clone()))
    }

    fn query_similar(
        &self,
        text: &str,
        memory_type: Option<MemoryType>,
        k: usize,
        min_significance: f32,
    ) -> Result<Vec<MemoryHit>> {
        self.query_filtered(text, k, |r| {
            memory_type.is_none_or(|t| r.memory_type() == t) && r.significance() >= min_significance
        })
    }

    fn query_by_location(&self, location: &str, k: usize) -> Result<Vec<MemoryHit>> {
        self.query_filtered(location, k, |r| r.location.as_deref() == Some(location))
    }

    fn query_by_emotion(&self, emotion: Emotion, k: usize) -> Result<Vec<MemoryHit>> {
        self.query_filtered(emotion.as_str(), k, |r| r.primary_emotion == Some(emotion))
    }

    fn update_metadata(
        &self,
        id: MemoryId,
        memory_type: MemoryType,
        updates: &[MemoryUpdate],
    ) -> Result<bool> {
        let mut guard = self.collections.write();
        let Some(stored) = guard.get_mut(&memory_type).and_then(|c| c.get_mut(&id)) else {
            return Ok(false);
        };
        for update in updates {
            update.apply(&mut stored.record);
        }
        Ok(true)
    }

    fn delete(&self, id: MemoryId, memory_type: MemoryType) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(&memory_type)
            .is_some_and(|c| c.remove(&id).is_some()))
    }

    fn count(&self, memory_type: Option<MemoryType>) -> Result<usize> {
        let guard = self.collections.read();
        Ok(match memory_type {
            Some(t) => guard.get(&t).map_or(0, BTreeMap::len),
            None => guard.values().map(BTreeMap::len).sum(),
        })
    }

    fn all(&self, memory_type: Option<MemoryType>) -> Result<Vec<MemoryRecord>> {
        let guard = self.collections.read();
        let mut records: Vec<MemoryRecord> = MemoryType::ALL
            .into_iter()
            .filter(|t| memory_type.is_none_or(|wanted| wanted == *t))
            .filter_map(|t| guard.get(&t))
            .flat_map(BTreeMap::values)
            .map(|s| s.record.clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    fn clear(&self) -> Result<()> {
        self.collections.write().clear();
        Ok(())
    }
}
