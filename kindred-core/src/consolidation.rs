//! Memory consolidation: turning significant interactions into long-term
//! memories.
//!
//! An interaction below the significance threshold leaves no trace. Above
//! it, one episodic record is always formed; a semantic fact, an emotional
//! association and a learned behaviour may follow. Behaviours are learned
//! from repetition, so the consolidator owns a pattern tracker that lives
//! as long as it does and is cleared only through
//! [`MemoryConsolidator::reset_patterns`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::MemoryConfig;
use crate::context::Context;
use crate::council::Decision;
use crate::memory::{EventType, FactCategory, MemoryRecord};
use crate::significance::{SignificanceScorer, contains_any};
use crate::store::MemoryStore;
use crate::types::MemoryId;

/// Occurrences of a behaviour needed before it becomes a habit.
pub const PATTERN_THRESHOLD: u32 = 3;

const TRAINER: &str = "trainer";
const QUOTE_LIMIT: usize = 100;
const SEMANTIC_DISCOUNT: f32 = 1.0;
const EMOTIONAL_INTENSITY_THRESHOLD: f32 = 7.0;

/// One exchange between the trainer and the companion.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    /// What the trainer said or did.
    pub input: String,
    /// How the companion replied.
    pub response: String,
    /// When it happened.
    pub at: DateTime<Utc>,
}

impl Interaction {
    /// An interaction happening now.
    #[must_use]
    pub fn new(input: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            response: response.into(),
            at: Utc::now(),
        }
    }

    /// Override the timestamp.
    #[must_use]
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }
}

// ---------------------------------------------------------------------------
// Behaviour patterns
// ---------------------------------------------------------------------------

struct PatternRule {
    name: &'static str,
    trigger: &'static str,
    content: &'static str,
    success_rate: f32,
    significance: f32,
    detect: fn(&Interaction, &Context) -> bool,
}

const PATTERN_RULES: [PatternRule; 2] = [
    PatternRule {
        name: "ask_for_food",
        trigger: "When hungry",
        content: "When hungry, look at trainer and make soft sounds to ask for food",
        success_rate: 0.8,
        significance: 7.0,
        detect: asks_for_food,
    },
    PatternRule {
        name: "seek_comfort",
        trigger: "When scared or afraid",
        content: "When scared, stay close to trainer and seek reassurance",
        success_rate: 0.9,
        significance: 7.5,
        detect: seeks_comfort,
    },
];

fn asks_for_food(i: &Interaction, ctx: &Context) -> bool {
    ctx.physical.hunger > 70.0 && contains_any(&i.input.to_lowercase(), &["feed", "food"])
}

fn seeks_comfort(i: &Interaction, _: &Context) -> bool {
    contains_any(&i.response.to_lowercase(), &["scared", "afraid"])
}

/// Counts how often each behaviour has been seen, with no time window.
#[derive(Debug, Clone, Default)]
pub struct BehaviorPatternTracker {
    seen: HashMap<&'static str, Vec<DateTime<Utc>>>,
}

impl BehaviorPatternTracker {
    /// Record one occurrence. Returns the new count.
    fn observe(&mut self, name: &'static str, at: DateTime<Utc>) -> u32 {
        let hits = self.seen.entry(name).or_default();
        hits.push(at);
        u32::try_from(hits.len()).unwrap_or(u32::MAX)
    }

    /// How many times `name` has been seen.
    #[must_use]
    pub fn count(&self, name: &str) -> u32 {
        self.seen
            .get(name)
            .map_or(0, |v| u32::try_from(v.len()).unwrap_or(u32::MAX))
    }

    /// Forget every occurrence.
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

// ---------------------------------------------------------------------------
// Consolidator
// ---------------------------------------------------------------------------

/// Decides what to remember and writes it to the store.
pub struct MemoryConsolidator {
    store: Arc<dyn MemoryStore>,
    scorer: SignificanceScorer,
    threshold: f32,
    patterns: BehaviorPatternTracker,
}

impl std::fmt::Debug for MemoryConsolidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryConsolidator")
            .field("threshold", &self.threshold)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl MemoryConsolidator {
    /// Create a consolidator writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            scorer: SignificanceScorer::new(),
            threshold: config.significance_threshold,
            patterns: BehaviorPatternTracker::default(),
        }
    }

    /// Form and persist memories for one interaction.
    ///
    /// Returns `None` when the interaction is not significant enough or
    /// nothing could be stored. Records the store rejects are logged and
    /// left out of the result.
    pub fn process_interaction(
        &mut self,
        interaction: &Interaction,
        ctx: &Context,
        decision: Option<&Decision>,
    ) -> Option<Vec<MemoryRecord>> {
        let decision = decision.or(ctx.decision.as_deref());
        let significance = self.scorer.score(&interaction.input, ctx, decision);
        if significance < self.threshold {
            debug!(significance, threshold = self.threshold, "Interaction not significant enough");
            return None;
        }
        info!(significance, "Consolidating significant interaction");

        let episodic = episodic_record(interaction, ctx, significance, decision);
        let episodic_id = episodic.id;
        let mut candidates = vec![episodic];
        candidates.extend(semantic_record(interaction, ctx, significance));
        candidates.extend(emotional_record(interaction, ctx, significance, episodic_id));
        candidates.extend(self.procedural_record(interaction, ctx));

        let stored: Vec<MemoryRecord> = candidates
            .into_iter()
            .filter(|record| match self.store.store(record) {
                Ok(()) => {
                    info!(
                        memory = %record.id,
                        memory_type = %record.memory_type(),
                        content = %record.content.chars().take(50).collect::<String>(),
                        "Stored memory"
                    );
                    true
                }
                Err(e) => {
                    warn!(memory_type = %record.memory_type(), error = %e, "Failed to store memory");
                    false
                }
            })
            .collect();

        if stored.is_empty() { None } else { Some(stored) }
    }

    /// Occurrences of a behaviour seen so far.
    #[must_use]
    pub fn pattern_count(&self, name: &str) -> u32 {
        self.patterns.count(name)
    }

    /// Forget all behaviour occurrences.
    pub fn reset_patterns(&mut self) {
        self.patterns.clear();
        debug!("Behaviour pattern history cleared");
    }

    /// Track matching behaviours in rule order. The first one to reach the
    /// threshold is learned and ends the scan; later rules go untracked for
    /// this interaction.
    fn procedural_record(&mut self, interaction: &Interaction, ctx: &Context) -> Option<MemoryRecord> {
        for rule in &PATTERN_RULES {
            if !(rule.detect)(interaction, ctx) {
                continue;
            }
            let count = self.patterns.observe(rule.name, interaction.at);
            if count >= PATTERN_THRESHOLD {
                debug!(behavior = rule.name, count, "Behaviour became a habit");
                return Some(
                    MemoryRecord::procedural(
                        rule.content,
                        rule.significance,
                        rule.name,
                        rule.trigger,
                        rule.success_rate,
                        count,
                    )
                    .created_at(interaction.at)
                    .with_tag("learned"),
                );
            }
        }
        None
    }
}

fn feeling(ctx: &Context) -> &'static str {
    ctx.primary_emotion.map_or("curious", |e| e.as_str())
}

fn episodic_record(
    interaction: &Interaction,
    ctx: &Context,
    significance: f32,
    decision: Option<&Decision>,
) -> MemoryRecord {
    let quote: String = interaction.input.chars().take(QUOTE_LIMIT).collect();
    let event_type = EventType::classify(&interaction.input);
    let content = format!(
        "Trainer said: '{quote}' at {}. Felt {}.",
        ctx.location,
        feeling(ctx)
    );
    let outcome = decision.map(|d| format!("Decision: {}", d.winner.decision));

    MemoryRecord::episodic(content, significance, event_type, outcome)
        .created_at(interaction.at)
        .with_emotion(ctx.primary_emotion, ctx.emotion_intensity)
        .with_location(ctx.location.clone())
        .with_participant(TRAINER)
        .with_tag("interaction")
        .with_tag(event_type.as_str())
}

fn semantic_record(
    interaction: &Interaction,
    ctx: &Context,
    significance: f32,
) -> Option<MemoryRecord> {
    let lower = interaction.input.to_lowercase();
    let significance = (significance - SEMANTIC_DISCOUNT).max(0.0);

    if contains_any(&lower, &["safe", "danger"]) {
        let fact = if ctx.location_safety < 5.0 {
            format!("{} is dangerous - must be careful here", ctx.location)
        } else {
            format!("{} is safe and comfortable", ctx.location)
        };
        return Some(
            MemoryRecord::semantic(fact, significance, FactCategory::Location, 0.7)
                .created_at(interaction.at)
                .with_location(ctx.location.clone())
                .with_tag(FactCategory::Location.as_str()),
        );
    }

    if lower.contains("berry") && lower.contains("health") {
        return Some(
            MemoryRecord::semantic(
                "Berries restore health and make me feel better",
                significance,
                FactCategory::Item,
                0.8,
            )
            .created_at(interaction.at)
            .with_tag(FactCategory::Item.as_str()),
        );
    }

    None
}

fn emotional_record(
    interaction: &Interaction,
    ctx: &Context,
    significance: f32,
    episodic_id: MemoryId,
) -> Option<MemoryRecord> {
    if ctx.emotion_intensity.is_nan() || ctx.emotion_intensity < EMOTIONAL_INTENSITY_THRESHOLD {
        return None;
    }
    let trigger = if ctx.location.is_empty() {
        "unknown"
    } else {
        ctx.location.as_str()
    };
    let emotion = feeling(ctx);
    let mut record = MemoryRecord::emotional(
        format!("{trigger} is associated with {emotion}"),
        significance,
        trigger,
        format!("Feel {emotion} when thinking about this"),
        vec![episodic_id],
    )
    .created_at(interaction.at)
    .with_emotion(ctx.primary_emotion, ctx.emotion_intensity)
    .with_related(episodic_id)
    .with_tag("association");
    if !ctx.location.is_empty() {
        record = record.with_location(ctx.location.clone());
    }
    Some(record)
}
