//! The read-only snapshot every agent and scorer sees during one cycle.

use crate::council::Decision;
use crate::types::{Emotion, Personality, PhysicalState, Relationship};

/// Where the companion is when no location is given.
pub const DEFAULT_LOCATION: &str = "trainer_home";

/// Safety assumed for a location when nothing else is known.
pub const DEFAULT_SAFETY: f32 = 10.0;

/// Emotion intensity assumed when nothing else is known.
pub const DEFAULT_EMOTION_INTENSITY: f32 = 5.0;

/// Everything the mind knows about the present moment.
///
/// Built fresh for every deliberation and never mutated by the core.
#[derive(Debug, Clone)]
pub struct Context {
    /// Hunger, energy, health and happiness (0–100).
    pub physical: PhysicalState,
    /// Trust and bond with the trainer (0–100).
    pub relationship: Relationship,
    /// Personality traits (0–10).
    pub personality: Personality,
    /// Current location id.
    pub location: String,
    /// How safe the current location feels (0–10).
    pub location_safety: f32,
    /// Raw text of the latest interactions, oldest first.
    pub recent_interactions: Vec<String>,
    /// The emotion currently in the foreground, if any.
    pub primary_emotion: Option<Emotion>,
    /// Intensity of the primary emotion (0–10).
    pub emotion_intensity: f32,
    /// The decision reached for this interaction, once available.
    pub decision: Option<Box<Decision>>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            physical: PhysicalState::default(),
            relationship: Relationship::default(),
            personality: Personality::default(),
            location: DEFAULT_LOCATION.to_string(),
            location_safety: DEFAULT_SAFETY,
            recent_interactions: Vec::new(),
            primary_emotion: None,
            emotion_intensity: DEFAULT_EMOTION_INTENSITY,
            decision: None,
        }
    }
}

impl Context {
    /// Set the location and its safety level.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>, safety: f32) -> Self {
        self.location = location.into();
        self.location_safety = safety.clamp(0.0, 10.0);
        self
    }

    /// Set the physical state.
    #[must_use]
    pub fn with_physical(mut self, physical: PhysicalState) -> Self {
        self.physical = physical.clamped();
        self
    }

    /// Set the relationship numbers.
    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationship = relationship;
        self
    }

    /// Set the personality.
    #[must_use]
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    /// Set the foreground emotion and its intensity.
    #[must_use]
    pub fn with_emotion(mut self, emotion: Emotion, intensity: f32) -> Self {
        self.primary_emotion = Some(emotion);
        self.emotion_intensity = intensity.clamp(0.0, 10.0);
        self
    }

    /// Set the recent interaction history.
    #[must_use]
    pub fn with_recent(mut self, recent: Vec<String>) -> Self {
        self.recent_interactions = recent;
        self
    }

    /// Attach the decision reached for this interaction.
    #[must_use]
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(Box::new(decision));
        self
    }
}
