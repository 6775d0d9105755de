//! Episodic memory — "What happened".

use serde::{Deserialize, Serialize};

/// Coarse classification of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Anything that doesn't fit the other kinds.
    Interaction,
    /// Going somewhere.
    Exploration,
    /// Finding or receiving something.
    Discovery,
    /// Play and affection.
    Social,
}

impl EventType {
    /// Classify raw interaction text by keyword.
    #[must_use]
    pub fn classify(input: &str) -> Self {
        let lower = input.to_lowercase();
        if lower.contains("explore") || lower.contains("go") {
            Self::Exploration
        } else if lower.contains("give") || lower.contains("found") {
            Self::Discovery
        } else if lower.contains("play") || lower.contains("pet") {
            Self::Social
        } else {
            Self::Interaction
        }
    }

    /// Lowercase name, also used as a tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interaction => "interaction",
            Self::Exploration => "exploration",
            Self::Discovery => "discovery",
            Self::Social => "social",
        }
    }
}

/// Episodic payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodicDetails {
    /// What kind of event this was.
    pub event_type: EventType,
    /// How it turned out.
    pub outcome: Option<String>,
}
