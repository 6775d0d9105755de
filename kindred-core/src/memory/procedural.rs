//! Procedural memory — "What I have learned to do".
//!
//! Behaviours that emerged from a trigger recurring often enough. Success
//! rate is a running average over every recorded use.

use serde::{Deserialize, Serialize};

/// Procedural payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralDetails {
    /// Stable behaviour name (e.g. `"ask_for_food"`).
    pub behavior_name: String,
    /// When the behaviour applies.
    pub trigger_condition: String,
    /// Fraction of uses that worked out (0–1).
    pub success_rate: f32,
    /// How many times the behaviour has been used.
    pub times_used: u32,
}

impl ProceduralDetails {
    /// Create a payload, clamping the success rate.
    #[must_use]
    pub fn new(
        behavior_name: impl Into<String>,
        trigger_condition: impl Into<String>,
        success_rate: f32,
        times_used: u32,
    ) -> Self {
        Self {
            behavior_name: behavior_name.into(),
            trigger_condition: trigger_condition.into(),
            success_rate: success_rate.clamp(0.0, 1.0),
            times_used,
        }
    }

    /// Fold one more use into the running average.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_use(&mut self, successful: bool) {
        let outcome = if successful { 1.0 } else { 0.0 };
        let prior = self.times_used as f32;
        self.success_rate = ((self.success_rate * prior + outcome) / (prior + 1.0)).clamp(0.0, 1.0);
        self.times_used = self.times_used.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average() {
        let mut p = ProceduralDetails::new("seek_comfort", "When scared", 0.5, 2);
        p.record_use(true);
        // (0.5 * 2 + 1) / 3
        assert!((p.success_rate - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(p.times_used, 3);
    }

    #[test]
    fn first_use_sets_rate_directly() {
        let mut p = ProceduralDetails::new("fetch", "When a stick is thrown", 0.9, 0);
        p.record_use(false);
        assert!(p.success_rate.abs() < f32::EPSILON);
        assert_eq!(p.times_used, 1);
    }
}
