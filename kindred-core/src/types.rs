//! Core type definitions shared across the companion mind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemoryId(pub Uuid);

impl MemoryId {
    /// Create a new random memory ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

/// A dense text embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

/// The emotions a companion can feel and attach to memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    /// Happiness, delight.
    Joy,
    /// Being scared.
    Fear,
    /// Feeling down.
    Sadness,
    /// Frustration, irritation.
    Anger,
    /// Being caught off guard.
    Surprise,
    /// Feeling safe with someone.
    Trust,
    /// Looking forward to something.
    Anticipation,
    /// Revulsion.
    Disgust,
    /// Thankfulness.
    Gratitude,
    /// Wanting to know more.
    Curiosity,
    /// Missing company.
    Loneliness,
    /// Quiet satisfaction.
    Contentment,
}

impl Emotion {
    /// Every emotion, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Joy,
        Self::Fear,
        Self::Sadness,
        Self::Anger,
        Self::Surprise,
        Self::Trust,
        Self::Anticipation,
        Self::Disgust,
        Self::Gratitude,
        Self::Curiosity,
        Self::Loneliness,
        Self::Contentment,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joy => "joy",
            Self::Fear => "fear",
            Self::Sadness => "sadness",
            Self::Anger => "anger",
            Self::Surprise => "surprise",
            Self::Trust => "trust",
            Self::Anticipation => "anticipation",
            Self::Disgust => "disgust",
            Self::Gratitude => "gratitude",
            Self::Curiosity => "curiosity",
            Self::Loneliness => "loneliness",
            Self::Contentment => "contentment",
        }
    }

    /// Lenient parse accepting nouns and common adjective forms
    /// (`"scared"`, `"joyful"`, `"lonely"`, ...). Case-insensitive.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let e = match s.trim().to_lowercase().as_str() {
            "joy" | "joyful" | "happy" => Self::Joy,
            "fear" | "scared" | "fearful" | "afraid" => Self::Fear,
            "sad" | "sadness" => Self::Sadness,
            "angry" | "anger" | "frustrated" => Self::Anger,
            "surprise" | "surprised" => Self::Surprise,
            "trust" | "trusting" => Self::Trust,
            "anticipation" => Self::Anticipation,
            "disgust" | "disgusted" => Self::Disgust,
            "gratitude" | "grateful" => Self::Gratitude,
            "curiosity" | "curious" => Self::Curiosity,
            "loneliness" | "lonely" => Self::Loneliness,
            "contentment" | "content" | "calm" => Self::Contentment,
            _ => return None,
        };
        Some(e)
    }

    /// Emotions that make an interaction more memorable.
    #[must_use]
    pub fn is_intense(self) -> bool {
        matches!(
            self,
            Self::Fear | Self::Joy | Self::Gratitude | Self::Loneliness | Self::Anger
        )
    }

    /// Pleasant emotions.
    #[must_use]
    pub fn is_positive(self) -> bool {
        matches!(
            self,
            Self::Joy | Self::Gratitude | Self::Trust | Self::Contentment
        )
    }

    /// Unpleasant emotions.
    #[must_use]
    pub fn is_negative(self) -> bool {
        matches!(
            self,
            Self::Fear | Self::Sadness | Self::Anger | Self::Loneliness | Self::Disgust
        )
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown emotion: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Companion state snapshots
// ---------------------------------------------------------------------------

/// Bodily state, each value on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalState {
    /// 0 = full, 100 = starving.
    pub hunger: f32,
    /// 0 = exhausted, 100 = fully rested.
    pub energy: f32,
    /// 0 = gravely hurt, 100 = healthy.
    pub health: f32,
    /// 0 = miserable, 100 = delighted.
    pub happiness: f32,
}

impl Default for PhysicalState {
    fn default() -> Self {
        Self {
            hunger: 40.0,
            energy: 70.0,
            health: 95.0,
            happiness: 85.0,
        }
    }
}

impl PhysicalState {
    /// Clamp every value into `[0, 100]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            hunger: self.hunger.clamp(0.0, 100.0),
            energy: self.energy.clamp(0.0, 100.0),
            health: self.health.clamp(0.0, 100.0),
            happiness: self.happiness.clamp(0.0, 100.0),
        }
    }
}

/// Relationship with the trainer, each value on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// How much the companion trusts the trainer.
    pub trust: f32,
    /// Depth of the emotional bond.
    pub bond: f32,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            trust: 50.0,
            bond: 30.0,
        }
    }
}

/// Personality traits, each on a 0–10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Drive to explore.
    pub curiosity: f32,
    /// Willingness to face danger.
    pub bravery: f32,
    /// Love of play.
    pub playfulness: f32,
    /// Attachment to the trainer.
    pub loyalty: f32,
    /// Comfort acting alone.
    pub independence: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            curiosity: 8.0,
            bravery: 5.0,
            playfulness: 9.0,
            loyalty: 10.0,
            independence: 6.0,
        }
    }
}

impl Personality {
    /// Short human-readable summary of the strongest traits.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut traits = Vec::new();
        if self.curiosity >= 7.0 {
            traits.push("very curious");
        }
        if self.playfulness >= 7.0 {
            traits.push("playful");
        }
        if self.loyalty >= 8.0 {
            traits.push("fiercely loyal");
        }
        if self.bravery <= 3.0 {
            traits.push("timid");
        } else if self.bravery >= 7.0 {
            traits.push("brave");
        }
        if self.independence >= 7.0 {
            traits.push("independent");
        }
        if traits.is_empty() {
            "even-tempered".to_string()
        } else {
            traits.join(", ")
        }
    }
}
