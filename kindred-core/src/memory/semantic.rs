//! Semantic memory — "What I know".
//!
//! Facts distilled from experience. Confidence grows each time the fact
//! is confirmed by a new interaction.

use serde::{Deserialize, Serialize};

/// Confidence gained per confirmation.
const VALIDATION_STEP: f32 = 0.1;

/// What a fact is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCategory {
    /// A place and how it feels.
    Location,
    /// An object and what it does.
    Item,
    /// The trainer or another companion.
    Relationship,
    /// Anything else.
    General,
}

impl FactCategory {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Item => "item",
            Self::Relationship => "relationship",
            Self::General => "general",
        }
    }
}

/// Semantic payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticDetails {
    /// What the fact is about.
    pub category: FactCategory,
    /// Belief in the fact (0–1).
    pub confidence: f32,
    /// How many interactions support it.
    pub evidence_count: u32,
}

impl SemanticDetails {
    /// A freshly learned fact backed by one piece of evidence.
    #[must_use]
    pub fn new(category: FactCategory, confidence: f32) -> Self {
        Self {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            evidence_count: 1,
        }
    }

    /// Another interaction confirmed the fact.
    pub fn validate(&mut self) {
        self.evidence_count = self.evidence_count.saturating_add(1);
        self.confidence = (self.confidence + VALIDATION_STEP).min(1.0);
    }
}
