//! Memory store contract and its backends.
//!
//! The core never touches storage directly; the consolidator, retriever and
//! decay manager all go through [`MemoryStore`]. Field updates are a closed
//! set ([`MemoryUpdate`]) applied atomically under the store's own lock, so
//! a decay pass and a retrieval touching the same record never interleave.

pub mod memory;
pub mod sqlite;

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;

use crate::error::Result;
use crate::memory::{MemoryRecord, MemoryType};
use crate::types::{Emotion, MemoryId};

pub use memory::InMemoryStore;
pub use sqlite::SqliteMemoryStore;

/// A record returned by a similarity query.
#[derive(Debug, Clone)]
pub struct MemoryHit {
    /// The stored record as of the query.
    pub record: MemoryRecord,
    /// Cosine similarity to the query text.
    pub similarity: f32,
}

/// A single field update applied by [`MemoryStore::update_metadata`].
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryUpdate {
    /// The record was retrieved at this time.
    Accessed {
        /// Retrieval time.
        at: DateTime<Utc>,
    },
    /// One decay pass at the given rate.
    Decayed {
        /// Forgetting rate for the pass.
        forgetting_rate: f32,
    },
    /// A semantic fact was confirmed.
    Validated,
    /// A procedural behaviour was used.
    UsageRecorded {
        /// Whether it worked.
        successful: bool,
    },
    /// Link to another memory.
    Related(MemoryId),
}

impl MemoryUpdate {
    /// Apply this update to a record in place.
    pub fn apply(&self, record: &mut MemoryRecord) {
        match self {
            Self::Accessed { at } => record.mark_accessed(*at),
            Self::Decayed { forgetting_rate } => {
                record.apply_decay(*forgetting_rate);
            }
            Self::Validated => {
                record.validate();
            }
            Self::UsageRecorded { successful } => {
                record.record_use(*successful);
            }
            Self::Related(id) => {
                record.related.insert(*id);
            }
        }
    }
}

/// Persistent home of long-term memories with similarity search.
///
/// Implementations must be `Send + Sync`; the core shares one store between
/// the consolidator, the retriever and the decay task.
pub trait MemoryStore: Send + Sync {
    /// Persist a record, replacing any record with the same id.
    ///
    /// # Errors
    /// Returns an error if the record could not be written.
    fn store(&self, record: &MemoryRecord) -> Result<()>;

    /// Fetch a record by id.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn get(&self, id: MemoryId, memory_type: MemoryType) -> Result<Option<MemoryRecord>>;

    /// The `k` records most similar to `text`, optionally restricted to one
    /// type, skipping records below `min_significance`. Ordered by
    /// similarity, highest first.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn query_similar(
        &self,
        text: &str,
        memory_type: Option<MemoryType>,
        k: usize,
        min_significance: f32,
    ) -> Result<Vec<MemoryHit>>;

    /// The `k` records formed at `location`, ranked by similarity to it.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn query_by_location(&self, location: &str, k: usize) -> Result<Vec<MemoryHit>>;

    /// The `k` records carrying `emotion`, ranked by similarity to it.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn query_by_emotion(&self, emotion: Emotion, k: usize) -> Result<Vec<MemoryHit>>;

    /// Apply `updates` in order to one record as a single atomic step.
    /// Returns `false` if no such record exists.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn update_metadata(
        &self,
        id: MemoryId,
        memory_type: MemoryType,
        updates: &[MemoryUpdate],
    ) -> Result<bool>;

    /// Remove a record. Returns `false` if it did not exist.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn delete(&self, id: MemoryId, memory_type: MemoryType) -> Result<bool>;

    /// Number of records, optionally of one type.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn count(&self, memory_type: Option<MemoryType>) -> Result<usize>;

    /// Every record, optionally of one type.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn all(&self, memory_type: Option<MemoryType>) -> Result<Vec<MemoryRecord>>;

    /// Remove every record.
    ///
    /// # Errors
    /// Returns an error if the backend fails.
    fn clear(&self) -> Result<()>;
}

/// Sort hits by similarity (newest first on ties) and keep the top `k`.
pub(crate) fn rank_hits(mut hits: Vec<MemoryHit>, k: usize) -> Vec<MemoryHit> {
    hits.sort_by_key(|h| (Reverse(OrderedFloat(h.similarity)), Reverse(h.record.created_at)));
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EventType, FactCategory};

    #[test]
    fn updates_apply_in_order() {
        let mut m = MemoryRecord::episodic("a walk", 5.0, EventType::Exploration, None)
            .with_strength(0.5);
        let now = Utc::now();
        for u in [
            MemoryUpdate::Decayed { forgetting_rate: 0.2 },
            MemoryUpdate::Accessed { at: now },
        ] {
            u.apply(&mut m);
        }
        // 0.5 - 0.2 * 0.5 + 0.05
        assert!((m.strength() - 0.45).abs() < 1e-6);
        assert_eq!(m.access_count(), 1);
    }

    #[test]
    fn variant_specific_updates_are_ignored_elsewhere() {
        let mut m = MemoryRecord::semantic("Lake is calm", 6.0, FactCategory::Location, 0.7);
        MemoryUpdate::UsageRecorded { successful: true }.apply(&mut m);
        MemoryUpdate::Validated.apply(&mut m);
        assert_eq!(m.as_semantic().map(|s| s.evidence_count), Some(2));
    }

    #[test]
    fn rank_keeps_top_k() {
        let hit = |s: f32| MemoryHit {
            record: MemoryRecord::episodic("x", 5.0, EventType::Interaction, None),
            similarity: s,
        };
        let ranked = rank_hits(vec![hit(0.2), hit(0.9), hit(0.5)], 2);
        let sims: Vec<f32> = ranked.iter().map(|h| h.similarity).collect();
        assert_eq!(sims, vec![0.9, 0.5]);
    }
}
