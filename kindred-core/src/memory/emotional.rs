//! Emotional memory — "How this makes me feel".

use serde::{Deserialize, Serialize};

use crate::types::MemoryId;

/// Emotional payload: a trigger and the feeling it evokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalDetails {
    /// What evokes the feeling (usually a location).
    pub trigger: String,
    /// The evoked response.
    pub response: String,
    /// Episodic memories the association was learned from.
    pub learned_from: Vec<MemoryId>,
}
