//! Significance scoring: how memorable was this interaction?
//!
//! The score starts at a neutral 5.0 and every matching factor adds its
//! bonus independently. The sum is clamped to `[0, 10]`, so the order in
//! which factors are checked never matters.

use std::fmt;

use crate::context::{Context, DEFAULT_EMOTION_INTENSITY};
use crate::council::Decision;

/// Score of an interaction with nothing notable about it.
pub const BASE_SIGNIFICANCE: f32 = 5.0;

/// Upper bound of the significance scale.
pub const MAX_SIGNIFICANCE: f32 = 10.0;

const NOVELTY_KEYWORDS: &[&str] = &["first", "new", "never", "discover", "found"];
const RELATIONSHIP_KEYWORDS: &[&str] = &["love", "trust", "friend", "care", "miss", "sorry"];
const GIFT_KEYWORDS: &[&str] = &["give", "gift"];

/// One contributor to a significance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignificanceFactor {
    /// Emotion intensity at or above 8.
    VeryIntenseEmotion,
    /// Emotion intensity at or above 7 (but below 8).
    IntenseEmotion,
    /// The primary emotion is one of the intense emotions.
    StrongEmotionKind,
    /// The input mentions something new.
    Novelty,
    /// The council was badly split (consensus below 0.3).
    DeepConflict,
    /// The council was somewhat split (consensus below 0.5).
    MildConflict,
    /// The input touches on the relationship.
    Relationship,
    /// Starving or exhausted.
    ExtremePhysicalState,
    /// The location is unsafe.
    Danger,
    /// Something was given.
    Gift,
}

impl SignificanceFactor {
    /// Points this factor adds.
    #[must_use]
    pub fn bonus(self) -> f32 {
        match self {
            Self::VeryIntenseEmotion => 2.0,
            Self::Novelty | Self::DeepConflict | Self::Gift => 1.5,
            Self::IntenseEmotion
            | Self::StrongEmotionKind
            | Self::Relationship
            | Self::ExtremePhysicalState
            | Self::Danger => 1.0,
            Self::MildConflict => 0.5,
        }
    }
}

impl fmt::Display for SignificanceFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VeryIntenseEmotion => "very_intense_emotion",
            Self::IntenseEmotion => "intense_emotion",
            Self::StrongEmotionKind => "strong_emotion_kind",
            Self::Novelty => "novelty",
            Self::DeepConflict => "deep_conflict",
            Self::MildConflict => "mild_conflict",
            Self::Relationship => "relationship",
            Self::ExtremePhysicalState => "extreme_physical_state",
            Self::Danger => "danger",
            Self::Gift => "gift",
        };
        f.write_str(name)
    }
}

/// Stateless significance scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignificanceScorer;

impl SignificanceScorer {
    /// Create a scorer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Every factor that applies to this interaction.
    #[must_use]
    pub fn factors(
        &self,
        input: &str,
        ctx: &Context,
        decision: Option<&Decision>,
    ) -> Vec<SignificanceFactor> {
        let lower = input.to_lowercase();
        let mut factors = Vec::new();

        let intensity = if ctx.emotion_intensity.is_finite() {
            ctx.emotion_intensity
        } else {
            DEFAULT_EMOTION_INTENSITY
        };
        if intensity >= 8.0 {
            factors.push(SignificanceFactor::VeryIntenseEmotion);
        } else if intensity >= 7.0 {
            factors.push(SignificanceFactor::IntenseEmotion);
        }

        if ctx.primary_emotion.is_some_and(|e| e.is_intense()) {
            factors.push(SignificanceFactor::StrongEmotionKind);
        }

        if contains_any(&lower, NOVELTY_KEYWORDS) {
            factors.push(SignificanceFactor::Novelty);
        }

        if let Some(d) = decision.or(ctx.decision.as_deref()) {
            if d.consensus < 0.3 {
                factors.push(SignificanceFactor::DeepConflict);
            } else if d.consensus < 0.5 {
                factors.push(SignificanceFactor::MildConflict);
            }
        }

        if contains_any(&lower, RELATIONSHIP_KEYWORDS) {
            factors.push(SignificanceFactor::Relationship);
        }

        if ctx.physical.hunger > 85.0 || ctx.physical.energy < 15.0 {
            factors.push(SignificanceFactor::ExtremePhysicalState);
        }

        if ctx.location_safety < 5.0 {
            factors.push(SignificanceFactor::Danger);
        }

        if contains_any(&lower, GIFT_KEYWORDS) {
            factors.push(SignificanceFactor::Gift);
        }

        factors
    }

    /// Significance of an interaction in `[0, 10]`.
    ///
    /// `decision` takes precedence over the decision attached to `ctx`.
    #[must_use]
    pub fn score(&self, input: &str, ctx: &Context, decision: Option<&Decision>) -> f32 {
        let raw = BASE_SIGNIFICANCE
            + self
                .factors(input, ctx, decision)
                .iter()
                .map(|f| f.bonus())
                .sum::<f32>();
        raw.clamp(0.0, MAX_SIGNIFICANCE)
    }
}

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
