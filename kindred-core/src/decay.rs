//! Forgetting.
//!
//! Each pass lowers every memory's strength by
//! `forgetting_rate × (1 − significance / 10)`, floored at zero. Exhausted
//! memories are kept; retention is left to the caller.

use tracing::{debug, info, warn};

use crate::config::MemoryConfig;
use crate::error::Result;
use crate::memory::MemoryRecord;
use crate::store::{MemoryStore, MemoryUpdate};

/// Outcome of one decay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Records looked at.
    pub examined: usize,
    /// Records whose strength went down.
    pub decayed: usize,
    /// Records at zero strength after the pass.
    pub exhausted: usize,
    /// Records the store failed to update.
    pub failed: usize,
}

/// Applies the forgetting curve.
#[derive(Debug, Clone, Copy)]
pub struct DecayManager {
    forgetting_rate: f32,
}

impl DecayManager {
    /// Create a manager with an explicit forgetting rate.
    #[must_use]
    pub fn new(forgetting_rate: f32) -> Self {
        Self {
            forgetting_rate: forgetting_rate.max(0.0),
        }
    }

    /// Create a manager from the memory settings.
    #[must_use]
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self::new(config.forgetting_rate)
    }

    /// The configured forgetting rate.
    #[must_use]
    pub fn forgetting_rate(&self) -> f32 {
        self.forgetting_rate
    }

    /// Strength lost per pass by a memory of this significance.
    #[must_use]
    pub fn decay_amount(&self, significance: f32) -> f32 {
        (self.forgetting_rate * (1.0 - significance.clamp(0.0, 10.0) / 10.0)).max(0.0)
    }

    /// Decay one record in place. Returns the new strength.
    pub fn apply(&self, record: &mut MemoryRecord) -> f32 {
        record.apply_decay(self.forgetting_rate)
    }

    /// Decay every record in `store`.
    ///
    /// Each record is updated through the store so the change is atomic
    /// against concurrent retrievals. A failed update is counted and the
    /// pass continues.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot list its records.
    pub fn run_pass(&self, store: &dyn MemoryStore) -> Result<DecayReport> {
        let records = store.all(None)?;
        let mut report = DecayReport {
            examined: records.len(),
            ..DecayReport::default()
        };
        let update = [MemoryUpdate::Decayed {
            forgetting_rate: self.forgetting_rate,
        }];

        for mut record in records {
            let before = record.strength();
            let after = self.apply(&mut record);
            match store.update_metadata(record.id, record.memory_type(), &update) {
                Ok(true) => {
                    if after < before {
                        report.decayed += 1;
                    }
                    if after <= 0.0 {
                        report.exhausted += 1;
                    }
                }
                Ok(false) => debug!(memory = %record.id, "Memory removed during decay pass"),
                Err(e) => {
                    warn!(memory = %record.id, error = %e, "Failed to decay memory");
                    report.failed += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            decayed = report.decayed,
            exhausted = report.exhausted,
            failed = report.failed,
            "Decay pass complete"
        );
        Ok(report)
    }
}

impl Default for DecayManager {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}
