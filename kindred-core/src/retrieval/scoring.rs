//! Relevance scoring for recalled memories.
//!
//! relevance = similarity + recency + strength + significance + context + access,
//! capped at [`RELEVANCE_CAP`].

use chrono::{DateTime, Utc};

use crate::memory::MemoryRecord;

/// Upper bound of a relevance score.
pub const RELEVANCE_CAP: f32 = 1.5;

/// Bonus for a memory formed at the current location.
pub const LOCATION_BONUS: f32 = 0.2;

/// Bonus for a memory carrying the current primary emotion.
pub const EMOTION_BONUS: f32 = 0.15;

/// +0.2 under a day old, +0.1 under a week.
#[must_use]
pub fn recency_bonus(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_hours = (now - created_at).num_seconds() as f64 / 3600.0;
    if age_hours < 24.0 {
        0.2
    } else if age_hours < 168.0 {
        0.1
    } else {
        0.0
    }
}

/// `(strength − 0.5) × 0.2`, so between −0.1 and +0.1.
#[must_use]
pub fn strength_bonus(strength: f32) -> f32 {
    (strength - 0.5) * 0.2
}

/// +0.15 at significance 8 or more, +0.10 at 7 or more.
#[must_use]
pub fn significance_bonus(significance: f32) -> f32 {
    if significance >= 8.0 {
        0.15
    } else if significance >= 7.0 {
        0.10
    } else {
        0.0
    }
}

/// +0.1 once a memory has been recalled more than five times.
#[must_use]
pub fn access_bonus(access_count: u32) -> f32 {
    if access_count > 5 { 0.1 } else { 0.0 }
}

/// Per-factor view of a relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelevanceBreakdown {
    /// Cosine similarity to the situation.
    pub similarity: f32,
    /// Age bonus.
    pub recency: f32,
    /// Strength bonus (may be negative).
    pub strength: f32,
    /// Significance bonus.
    pub significance: f32,
    /// Location or emotion bonus.
    pub context: f32,
    /// Frequent-recall bonus.
    pub access: f32,
}

impl RelevanceBreakdown {
    /// Score every factor for `record`.
    #[must_use]
    pub fn for_record(
        record: &MemoryRecord,
        similarity: f32,
        context_bonus: f32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            similarity,
            recency: recency_bonus(record.created_at, now),
            strength: strength_bonus(record.strength()),
            significance: significance_bonus(record.significance()),
            context: context_bonus,
            access: access_bonus(record.access_count()),
        }
    }

    /// The capped sum of every factor.
    #[must_use]
    pub fn total(&self) -> f32 {
        let sum = self.similarity
            + self.recency
            + self.strength
            + self.significance
            + self.context
            + self.access;
        if sum.is_nan() { 0.0 } else { sum.min(RELEVANCE_CAP) }
    }
}

/// Relevance of `record` to the current situation.
#[must_use]
pub fn relevance(
    record: &MemoryRecord,
    similarity: f32,
    context_bonus: f32,
    now: DateTime<Utc>,
) -> f32 {
    RelevanceBreakdown::for_record(record, similarity, context_bonus, now).total()
}
