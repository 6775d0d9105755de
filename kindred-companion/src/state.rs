//! The companion's persistent self: vitals, relationship, personality and
//! whereabouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_core::context::{DEFAULT_LOCATION, DEFAULT_SAFETY};
use kindred_core::{Context, Personality, PhysicalState, Relationship};

/// Name used when none is configured.
pub const DEFAULT_NAME: &str = "Pip";

/// Everything about the companion that outlives a single interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionState {
    /// What the companion is called.
    pub name: String,
    /// Hunger, energy, health and happiness (0–100).
    pub physical: PhysicalState,
    /// Trust and bond with the trainer (0–100).
    pub relationship: Relationship,
    /// Personality traits (0–10).
    pub personality: Personality,
    /// Current location id.
    pub location: String,
    /// Safety of the current location (0–10).
    pub location_safety: f32,
    /// When the trainer last spoke to the companion.
    pub last_interaction: Option<DateTime<Utc>>,
}

impl Default for CompanionState {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            physical: PhysicalState::default(),
            relationship: Relationship::default(),
            personality: Personality::default(),
            location: DEFAULT_LOCATION.to_string(),
            location_safety: DEFAULT_SAFETY,
            last_interaction: None,
        }
    }
}

impl CompanionState {
    /// A companion with default traits and the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Move to `location`.
    pub fn move_to(&mut self, location: impl Into<String>, safety: f32) {
        self.location = location.into();
        self.location_safety = safety.clamp(0.0, 10.0);
    }

    /// Snapshot for one deliberation cycle.
    #[must_use]
    pub fn to_context(&self, recent: Vec<String>) -> Context {
        Context::default()
            .with_physical(self.physical.clamped())
            .with_relationship(self.relationship)
            .with_personality(self.personality)
            .with_location(self.location.clone(), self.location_safety)
            .with_recent(recent)
    }

    /// Hours since the last interaction, or `None` if there never was one.
    #[must_use]
    pub fn hours_since_last(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_interaction.map(|last| {
            let secs = (now - last).num_milliseconds().max(0) as f64 / 1000.0;
            secs / 3600.0
        })
    }

    /// One sentence on how the companion seems right now.
    #[must_use]
    pub fn mood_description(&self) -> String {
        let p = self.physical;
        let mut parts = vec![match p.happiness {
            h if h > 80.0 => "very happy and content",
            h if h > 60.0 => "cheerful",
            h if h > 40.0 => "calm",
            h if h > 20.0 => "a bit down",
            _ => "sad and lonely",
        }];

        if p.energy > 80.0 {
            parts.push("full of energy");
        } else if p.energy < 30.0 {
            parts.push("quite tired");
        }

        if p.hunger > 70.0 {
            parts.push("very hungry");
        } else if p.hunger > 50.0 {
            parts.push("getting hungry");
        }

        format!("{} seems {}.", self.name, parts.join(", "))
    }
}
