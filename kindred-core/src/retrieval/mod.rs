//! Context-aware memory retrieval.
//!
//! Three store queries are merged for every situation:
//!
//! 1. similarity to the situation text (oversampled 2×)
//! 2. memories formed at the current location (+0.2)
//! 3. memories carrying the current primary emotion (+0.15)
//!
//! Later queries never repeat a record an earlier query already returned.
//! The merged list is ranked by [`scoring::relevance`], truncated to the
//! configured count, and every returned record is reinforced in the store.
//!
//! Store failures are logged and treated as "nothing remembered".

pub mod scoring;

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use tracing::{debug, warn};

use crate::config::MemoryConfig;
use crate::context::Context;
use crate::error::Result;
use crate::memory::{MemoryRecord, MemoryType};
use crate::store::{MemoryHit, MemoryStore, MemoryUpdate};
use crate::types::{Emotion, MemoryId};

use scoring::{EMOTION_BONUS, LOCATION_BONUS};

const LOCATION_QUERY_SIZE: usize = 3;
const EMOTION_QUERY_SIZE: usize = 2;
const EMOTIONAL_ASSOCIATION_LIMIT: usize = 3;
const PROCEDURAL_CANDIDATES: usize = 5;

/// Which query surfaced a recalled memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecallSource {
    /// Similar to the situation text.
    Similarity,
    /// Formed at the current location.
    Location,
    /// Carries the current primary emotion.
    Emotion,
}

/// A memory together with how relevant it is right now.
#[derive(Debug, Clone)]
pub struct RecalledMemory {
    /// The record, with this retrieval already counted.
    pub record: MemoryRecord,
    /// Combined relevance (0–1.5).
    pub relevance: f32,
    /// Raw cosine similarity from the store.
    pub similarity: f32,
    /// Which query found it.
    pub source: RecallSource,
}

/// The best learned behaviour for a situation.
#[derive(Debug, Clone)]
pub struct BehaviorMatch {
    /// The procedural record.
    pub record: MemoryRecord,
    /// `similarity × 0.6 + success_rate × 0.4`.
    pub score: f32,
}

/// A feeling learned about a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionalAssociation {
    /// The emotion felt, if recorded.
    pub emotion: Option<Emotion>,
    /// The learned response.
    pub response: String,
    /// Intensity of the emotion (0–10).
    pub intensity: f32,
}

/// Finds the memories that matter for the current moment.
pub struct MemoryRetriever {
    store: Arc<dyn MemoryStore>,
    retrieval_count: usize,
    significance_threshold: f32,
}

impl std::fmt::Debug for MemoryRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRetriever")
            .field("retrieval_count", &self.retrieval_count)
            .field("significance_threshold", &self.significance_threshold)
            .finish_non_exhaustive()
    }
}

impl MemoryRetriever {
    /// Create a retriever over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            retrieval_count: config.retrieval_count,
            significance_threshold: config.significance_threshold,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// The most relevant memories for `situation`, best first.
    #[must_use]
    pub fn retrieve_relevant(&self, situation: &str, ctx: &Context) -> Vec<RecalledMemory> {
        self.retrieve_relevant_at(situation, ctx, Utc::now())
    }

    /// [`Self::retrieve_relevant`] with an explicit clock.
    #[must_use]
    pub fn retrieve_relevant_at(
        &self,
        situation: &str,
        ctx: &Context,
        now: DateTime<Utc>,
    ) -> Vec<RecalledMemory> {
        let mut recalled = match self.gather(situation, ctx, now) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Memory retrieval failed, continuing without memories");
                return Vec::new();
            }
        };

        recalled.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.relevance)));
        recalled.truncate(self.retrieval_count);

        for r in &mut recalled {
            let update = [MemoryUpdate::Accessed { at: now }];
            match self
                .store
                .update_metadata(r.record.id, r.record.memory_type(), &update)
            {
                Ok(true) => r.record.mark_accessed(now),
                Ok(false) => debug!(memory = %r.record.id, "Recalled memory vanished before update"),
                Err(e) => warn!(memory = %r.record.id, error = %e, "Failed to mark memory accessed"),
            }
        }

        debug!(situation, count = recalled.len(), "Retrieved relevant memories");
        recalled
    }

    fn gather(
        &self,
        situation: &str,
        ctx: &Context,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecalledMemory>> {
        let mut seen: HashSet<MemoryId> = HashSet::new();
        let mut out = Vec::new();

        let mut take = |hits: Vec<MemoryHit>, bonus: f32, source: RecallSource| {
            for hit in hits {
                if !seen.insert(hit.record.id) {
                    continue;
                }
                out.push(RecalledMemory {
                    relevance: scoring::relevance(&hit.record, hit.similarity, bonus, now),
                    similarity: hit.similarity,
                    record: hit.record,
                    source,
                });
            }
        };

        let similar = self.store.query_similar(
            situation,
            None,
            self.retrieval_count.saturating_mul(2),
            self.significance_threshold - 2.0,
        )?;
        take(similar, 0.0, RecallSource::Similarity);

        if !ctx.location.is_empty() {
            let here = self.store.query_by_location(&ctx.location, LOCATION_QUERY_SIZE)?;
            take(here, LOCATION_BONUS, RecallSource::Location);
        }

        if let Some(emotion) = ctx.primary_emotion {
            let felt = self.store.query_by_emotion(emotion, EMOTION_QUERY_SIZE)?;
            take(felt, EMOTION_BONUS, RecallSource::Emotion);
        }

        Ok(out)
    }

    /// Similar memories of one type, with a looser significance floor.
    #[must_use]
    pub fn retrieve_by_type(
        &self,
        situation: &str,
        memory_type: MemoryType,
        k: usize,
    ) -> Vec<MemoryHit> {
        self.store
            .query_similar(
                situation,
                Some(memory_type),
                k,
                self.significance_threshold - 3.0,
            )
            .unwrap_or_else(|e| {
                warn!(memory_type = %memory_type, error = %e, "Typed retrieval failed");
                Vec::new()
            })
    }

    /// The learned behaviour that best fits `situation`, if any.
    #[must_use]
    pub fn retrieve_procedural_for_situation(&self, situation: &str) -> Option<BehaviorMatch> {
        self.retrieve_by_type(situation, MemoryType::Procedural, PROCEDURAL_CANDIDATES)
            .into_iter()
            .filter_map(|hit| {
                let success = hit.record.as_procedural()?.success_rate;
                Some(BehaviorMatch {
                    score: hit.similarity * 0.6 + success * 0.4,
                    record: hit.record,
                })
            })
            .filter(|m| m.score > 0.0)
            .max_by_key(|m| OrderedFloat(m.score))
    }

    /// Feelings previously learned about `trigger`.
    #[must_use]
    pub fn emotional_associations(&self, trigger: &str) -> Vec<EmotionalAssociation> {
        self.store
            .query_similar(trigger, Some(MemoryType::Emotional), EMOTIONAL_ASSOCIATION_LIMIT, 0.0)
            .unwrap_or_else(|e| {
                warn!(trigger, error = %e, "Emotional association lookup failed");
                Vec::new()
            })
            .into_iter()
            .map(|hit| EmotionalAssociation {
                emotion: hit.record.primary_emotion,
                response: hit
                    .record
                    .as_emotional()
                    .map(|d| d.response.clone())
                    .unwrap_or_default(),
                intensity: hit.record.emotion_intensity,
            })
            .collect()
    }

    /// Explicit search across every type with no significance floor.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<MemoryHit> {
        self.store
            .query_similar(query, None, limit, 0.0)
            .unwrap_or_else(|e| {
                warn!(query, error = %e, "Memory search failed");
                Vec::new()
            })
    }
}

/// Render recalled memories as a numbered list for a prompt.
#[must_use]
pub fn format_for_context(memories: &[RecalledMemory], include_metadata: bool) -> String {
    if memories.is_empty() {
        return "No relevant memories found.".to_string();
    }
    let mut out = String::new();
    for (i, m) in memories.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}. {}", i + 1, m.record.content);
        if include_metadata {
            let emotion = m.record.primary_emotion.map_or("neutral", Emotion::as_str);
            let location = m.record.location.as_deref().unwrap_or("unknown");
            let _ = write!(
                out,
                " [emotion: {emotion}, location: {location}, relevance: {:.2}]",
                m.relevance
            );
        }
    }
    out
}
