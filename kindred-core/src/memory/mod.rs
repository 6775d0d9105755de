//! Long-term memory records.
//!
//! Every record shares a common base (content, significance, emotion,
//! strength, access statistics) and carries one variant-specific payload:
//!
//! - **Episodic**: "What happened"
//! - **Semantic**: "What I know"
//! - **Emotional**: "How this makes me feel"
//! - **Procedural**: "What I have learned to do"
//!
//! Significance is fixed at creation. Strength only moves through
//! [`MemoryRecord::mark_accessed`] and [`MemoryRecord::apply_decay`].

pub mod emotional;
pub mod episodic;
pub mod procedural;
pub mod semantic;
pub mod working;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Emotion, MemoryId};

pub use emotional::EmotionalDetails;
pub use episodic::{EpisodicDetails, EventType};
pub use procedural::ProceduralDetails;
pub use semantic::{FactCategory, SemanticDetails};
pub use working::WorkingMemory;

/// Strength gained each time a memory is retrieved.
pub const ACCESS_REINFORCEMENT: f32 = 0.05;

/// Emotion intensity given to records created without one.
pub const DEFAULT_RECORD_INTENSITY: f32 = 5.0;

// ---------------------------------------------------------------------------
// MemoryType
// ---------------------------------------------------------------------------

/// The four long-term memory tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Events.
    Episodic,
    /// Facts.
    Semantic,
    /// Associations between triggers and feelings.
    Emotional,
    /// Learned behaviours.
    Procedural,
}

impl MemoryType {
    /// Every memory type.
    pub const ALL: [Self; 4] = [
        Self::Episodic,
        Self::Semantic,
        Self::Emotional,
        Self::Procedural,
    ];

    /// Lowercase name, used as the storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Emotional => "emotional",
            Self::Procedural => "procedural",
        }
    }

    /// Inverse of [`MemoryType::as_str`].
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for MemoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MemoryKind
// ---------------------------------------------------------------------------

/// Variant-specific payload of a [`MemoryRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoryKind {
    /// An event.
    Episodic(EpisodicDetails),
    /// A fact.
    Semantic(SemanticDetails),
    /// A trigger/feeling association.
    Emotional(EmotionalDetails),
    /// A learned behaviour.
    Procedural(ProceduralDetails),
}

impl MemoryKind {
    /// The tier this payload belongs to.
    #[must_use]
    pub fn memory_type(&self) -> MemoryType {
        match self {
            Self::Episodic(_) => MemoryType::Episodic,
            Self::Semantic(_) => MemoryType::Semantic,
            Self::Emotional(_) => MemoryType::Emotional,
            Self::Procedural(_) => MemoryType::Procedural,
        }
    }

    fn default_tags(&self) -> &'static [&'static str] {
        match self {
            Self::Episodic(_) => &["episodic", "event"],
            Self::Semantic(_) => &["semantic", "knowledge", "fact"],
            Self::Emotional(_) => &["emotional", "feeling"],
            Self::Procedural(_) => &["procedural", "behavior"],
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryRecord
// ---------------------------------------------------------------------------

/// A single long-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier.
    pub id: MemoryId,
    /// Natural-language content, used for similarity search.
    pub content: String,
    /// When the memory was formed.
    pub created_at: DateTime<Utc>,
    significance: f32,
    /// Emotion attached to the memory.
    pub primary_emotion: Option<Emotion>,
    /// Intensity of that emotion (0–10).
    pub emotion_intensity: f32,
    /// Where it happened.
    pub location: Option<String>,
    /// Who was involved.
    pub participants: BTreeSet<String>,
    /// Free-form labels.
    pub tags: BTreeSet<String>,
    strength: f32,
    access_count: u32,
    last_accessed: Option<DateTime<Utc>>,
    /// Other memories this one is linked to.
    pub related: BTreeSet<MemoryId>,
    /// Variant-specific payload.
    pub kind: MemoryKind,
}

impl MemoryRecord {
    /// Create a record with full strength, no accesses and the default tags
    /// for its variant. Significance is clamped to `[0, 10]`.
    #[must_use]
    pub fn new(content: impl Into<String>, significance: f32, kind: MemoryKind) -> Self {
        let tags = kind.default_tags().iter().map(|t| (*t).to_string()).collect();
        Self {
            id: MemoryId::new(),
            content: content.into(),
            created_at: Utc::now(),
            significance: significance.clamp(0.0, 10.0),
            primary_emotion: None,
            emotion_intensity: DEFAULT_RECORD_INTENSITY,
            location: None,
            participants: BTreeSet::new(),
            tags,
            strength: 1.0,
            access_count: 0,
            last_accessed: None,
            related: BTreeSet::new(),
            kind,
        }
    }

    /// Create an episodic record.
    #[must_use]
    pub fn episodic(
        content: impl Into<String>,
        significance: f32,
        event_type: EventType,
        outcome: Option<String>,
    ) -> Self {
        Self::new(
            content,
            significance,
            MemoryKind::Episodic(EpisodicDetails {
                event_type,
                outcome,
            }),
        )
    }

    /// Create a semantic record.
    #[must_use]
    pub fn semantic(
        content: impl Into<String>,
        significance: f32,
        category: FactCategory,
        confidence: f32,
    ) -> Self {
        Self::new(
            content,
            significance,
            MemoryKind::Semantic(SemanticDetails::new(category, confidence)),
        )
        .with_tag(category.as_str())
    }

    /// Create an emotional record.
    #[must_use]
    pub fn emotional(
        content: impl Into<String>,
        significance: f32,
        trigger: impl Into<String>,
        response: impl Into<String>,
        learned_from: Vec<MemoryId>,
    ) -> Self {
        Self::new(
            content,
            significance,
            MemoryKind::Emotional(EmotionalDetails {
                trigger: trigger.into(),
                response: response.into(),
                learned_from,
            }),
        )
    }

    /// Create a procedural record.
    #[must_use]
    pub fn procedural(
        content: impl Into<String>,
        significance: f32,
        behavior_name: impl Into<String>,
        trigger_condition: impl Into<String>,
        success_rate: f32,
        times_used: u32,
    ) -> Self {
        Self::new(
            content,
            significance,
            MemoryKind::Procedural(ProceduralDetails::new(
                behavior_name,
                trigger_condition,
                success_rate,
                times_used,
            )),
        )
    }

    // -- builders -----------------------------------------------------------

    /// Attach an emotion and its intensity (clamped to `[0, 10]`).
    #[must_use]
    pub fn with_emotion(mut self, emotion: Option<Emotion>, intensity: f32) -> Self {
        self.primary_emotion = emotion;
        self.emotion_intensity = intensity.clamp(0.0, 10.0);
        self
    }

    /// Attach a location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add a participant.
    #[must_use]
    pub fn with_participant(mut self, participant: impl Into<String>) -> Self {
        self.participants.insert(participant.into());
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Link to another memory.
    #[must_use]
    pub fn with_related(mut self, id: MemoryId) -> Self {
        self.related.insert(id);
        self
    }

    /// Override the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Set the initial strength (clamped to `[0, 1]`).
    #[must_use]
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    // -- accessors ----------------------------------------------------------

    /// Which tier this record lives in.
    #[must_use]
    pub fn memory_type(&self) -> MemoryType {
        self.kind.memory_type()
    }

    /// Importance fixed at creation (0–10).
    #[must_use]
    pub fn significance(&self) -> f32 {
        self.significance
    }

    /// Current retrievability (0–1).
    #[must_use]
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// How many times this memory has been retrieved.
    #[must_use]
    pub fn access_count(&self) -> u32 {
        self.access_count
    }

    /// When this memory was last retrieved.
    #[must_use]
    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        self.last_accessed
    }

    /// Semantic payload, if this is a semantic record.
    #[must_use]
    pub fn as_semantic(&self) -> Option<&SemanticDetails> {
        match &self.kind {
            MemoryKind::Semantic(s) => Some(s),
            _ => None,
        }
    }

    /// Procedural payload, if this is a procedural record.
    #[must_use]
    pub fn as_procedural(&self) -> Option<&ProceduralDetails> {
        match &self.kind {
            MemoryKind::Procedural(p) => Some(p),
            _ => None,
        }
    }

    /// Emotional payload, if this is an emotional record.
    #[must_use]
    pub fn as_emotional(&self) -> Option<&EmotionalDetails> {
        match &self.kind {
            MemoryKind::Emotional(e) => Some(e),
            _ => None,
        }
    }

    // -- mutation -----------------------------------------------------------

    /// Record a retrieval: bump the access count, stamp the time and
    /// reinforce strength.
    pub fn mark_accessed(&mut self, at: DateTime<Utc>) {
        self.access_count = self.access_count.saturating_add(1);
        self.last_accessed = Some(at);
        self.strength = (self.strength + ACCESS_REINFORCEMENT).min(1.0);
    }

    /// Strength lost per decay pass at the given rate.
    #[must_use]
    pub fn decay_amount(&self, forgetting_rate: f32) -> f32 {
        (forgetting_rate * (1.0 - self.significance / 10.0)).max(0.0)
    }

    /// Apply one decay pass. Returns the new strength.
    pub fn apply_decay(&mut self, forgetting_rate: f32) -> f32 {
        self.strength = (self.strength - self.decay_amount(forgetting_rate)).max(0.0);
        self.strength
    }

    /// Confirm a semantic fact. Returns `false` for other variants.
    pub fn validate(&mut self) -> bool {
        match &mut self.kind {
            MemoryKind::Semantic(s) => {
                s.validate();
                true
            }
            _ => false,
        }
    }

    /// Record one use of a procedural behaviour. Returns `false` for other
    /// variants.
    pub fn record_use(&mut self, successful: bool) -> bool {
        match &mut self.kind {
            MemoryKind::Procedural(p) => {
                p.record_use(successful);
                true
            }
            _ => false,
        }
    }
}
