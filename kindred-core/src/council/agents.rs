//! The agent panel.
//!
//! Five agents, each a pure function of the situation and the context.
//! Keywords are matched as lowercase substrings of the situation text.
//!
//! | Agent    | Base weight | Concern                     |
//! |----------|-------------|-----------------------------|
//! | Logic    | 0.25        | planning, trade-offs        |
//! | Survival | 0.30        | emotion, safety             |
//! | Recall   | 0.20        | past experience             |
//! | Needs    | 0.15        | hunger, energy, health      |
//! | Instinct | 0.10        | reflexes, personality       |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{CouncilConfig, WeightModulation};
use crate::context::Context;
use crate::council::decision::Vote;
use crate::embedding::tokenize;
use crate::retrieval::RecalledMemory;
use crate::significance::contains_any;

const POSITIVE_MEMORY_WORDS: &[&str] = &["positive", "fun", "happy", "safe", "enjoy", "love"];
const NEGATIVE_MEMORY_WORDS: &[&str] = &["scary", "bad", "hurt", "danger", "unsafe"];

/// The fixed set of agent kinds, in panel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Planning and trade-offs.
    Logic,
    /// Emotion and self-preservation.
    Survival,
    /// Past experience.
    Recall,
    /// Bodily needs.
    Needs,
    /// Reflexes and personality.
    Instinct,
}

impl AgentKind {
    /// Every kind, in panel order.
    pub const ALL: [Self; 5] = [
        Self::Logic,
        Self::Survival,
        Self::Recall,
        Self::Needs,
        Self::Instinct,
    ];

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Logic => "Logic",
            Self::Survival => "Survival",
            Self::Recall => "Recall",
            Self::Needs => "Needs",
            Self::Instinct => "Instinct",
        }
    }

    /// One-line description of what the agent weighs.
    #[must_use]
    pub fn role(self) -> &'static str {
        match self {
            Self::Logic => "logic, planning and consequences",
            Self::Survival => "emotion, fear and safety",
            Self::Recall => "memories of similar moments",
            Self::Needs => "hunger, energy and health",
            Self::Instinct => "reflexes and personality",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One member of the panel.
#[derive(Debug, Clone)]
pub struct Agent {
    kind: AgentKind,
    base_weight: f32,
    modulation: WeightModulation,
}

impl Agent {
    /// Create an agent with an explicit base weight.
    #[must_use]
    pub fn new(kind: AgentKind, base_weight: f32, modulation: WeightModulation) -> Self {
        Self {
            kind,
            base_weight,
            modulation,
        }
    }

    /// The standard five-agent panel.
    #[must_use]
    pub fn panel(config: &CouncilConfig) -> Vec<Self> {
        let w = &config.weights;
        AgentKind::ALL
            .into_iter()
            .map(|kind| {
                let base = match kind {
                    AgentKind::Logic => w.logic,
                    AgentKind::Survival => w.survival,
                    AgentKind::Recall => w.recall,
                    AgentKind::Needs => w.needs,
                    AgentKind::Instinct => w.instinct,
                };
                Self::new(kind, base, config.modulation.clone())
            })
            .collect()
    }

    /// Which agent this is.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Static weight before modulation.
    #[must_use]
    pub fn base_weight(&self) -> f32 {
        self.base_weight
    }

    /// Whether the agent votes from retrieved memories.
    #[must_use]
    pub fn uses_memory(&self) -> bool {
        self.kind == AgentKind::Recall
    }

    /// Weight after context-driven overrides.
    #[must_use]
    pub fn effective_weight(&self, ctx: &Context) -> f32 {
        let m = &self.modulation;
        match self.kind {
            AgentKind::Survival if ctx.location_safety < 5.0 => m.survival_danger_weight,
            AgentKind::Survival if ctx.physical.health < 30.0 => m.survival_injured_weight,
            AgentKind::Needs
                if ctx.physical.hunger > 80.0 || ctx.physical.energy < 20.0 =>
            {
                m.needs_urgent_weight
            }
            AgentKind::Needs if ctx.physical.hunger > 60.0 || ctx.physical.energy < 40.0 => {
                m.needs_mild_weight
            }
            _ => self.base_weight,
        }
    }

    /// Cast a vote. `recalled` is only consulted by the Recall agent and
    /// is expected to be ordered by relevance, best first.
    #[must_use]
    pub fn analyze(&self, situation: &str, ctx: &Context, recalled: &[RecalledMemory]) -> Vote {
        let s = situation.to_lowercase();
        match self.kind {
            AgentKind::Logic => logic(&s, ctx),
            AgentKind::Survival => survival(&s, ctx),
            AgentKind::Recall => recall(&s, ctx, recalled),
            AgentKind::Needs => needs(&s, ctx),
            AgentKind::Instinct => instinct(&s, ctx),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-agent rules
// ---------------------------------------------------------------------------

fn logic(s: &str, ctx: &Context) -> Vote {
    const EW: f32 = 0.3;
    let p = &ctx.physical;
    let vote = |d: &str, r: &str, c: f32| Vote::new(AgentKind::Logic, d, r, c, EW);

    if contains_any(s, &["explore", "adventure"]) {
        if p.energy > 40.0 {
            vote(
                "agree_cautiously",
                "Exploring could be rewarding, but we should stay alert and stick together.",
                0.7 + ctx.relationship.trust / 200.0,
            )
        } else {
            vote(
                "suggest_rest_first",
                "We're running low on energy. Resting first would be wiser.",
                0.8,
            )
        }
    } else if s.contains("play") {
        if p.energy > 30.0 {
            vote("agree", "Playing is good for us and there's energy to spare.", 0.8)
        } else {
            vote("suggest_later", "Too worn out to play well right now. Later.", 0.7)
        }
    } else if contains_any(s, &["food", "eat"]) {
        vote("agree", "Eating keeps us strong. No reason to refuse.", 0.9)
    } else {
        vote(
            "consider_options",
            "Let's think about what makes the most sense here.",
            0.6,
        )
    }
}

fn survival(s: &str, ctx: &Context) -> Vote {
    let trust = ctx.relationship.trust;
    let safety = ctx.location_safety;
    let vote = |d: &str, r: &str, c: f32, ew: f32| Vote::new(AgentKind::Survival, d, r, c, ew);

    if s.contains("trainer") && trust > 60.0 {
        vote(
            "enthusiastic_yes",
            "It's my trainer! I'm so happy when we're together!",
            0.95,
            1.0,
        )
    } else if s.contains("explore") {
        if safety > 7.0 && trust > 60.0 {
            vote(
                "excited_agree",
                "This place feels safe and I trust my trainer. Let's go!",
                0.8,
                0.9,
            )
        } else if safety < 5.0 {
            vote(
                "fear_disagree",
                "Scary... unknown places make me nervous. Too dangerous!",
                0.9,
                1.0,
            )
        } else {
            vote(
                "cautious_maybe",
                "I'm a little nervous, but maybe it's okay if we're careful.",
                0.6,
                0.7,
            )
        }
    } else if s.contains("play") {
        if ctx.physical.happiness > 50.0 {
            vote("joyful_yes", "Playing makes me so happy!", 0.9, 1.0)
        } else {
            vote(
                "subdued_yes",
                "I'm not feeling great, but playing might help.",
                0.6,
                0.5,
            )
        }
    } else if contains_any(s, &["alone", "leave"]) {
        vote(
            "sad_protest",
            "Don't leave me alone! I'd be so lonely without you.",
            0.8,
            0.9,
        )
    } else {
        vote("curious", "I wonder what this is about...", 0.5, 0.6)
    }
}

fn recall(s: &str, ctx: &Context, recalled: &[RecalledMemory]) -> Vote {
    const EW: f32 = 0.4;
    let vote = |d: &str, r: String, c: f32| Vote::new(AgentKind::Recall, d, r, c, EW);

    if let Some(best) = recalled.first() {
        let record = &best.record;
        let content = record.content.to_lowercase();
        let emotion = record.primary_emotion;
        let snippet: String = record.content.chars().take(80).collect();

        // Negative first: "unsafe" contains "safe".
        if emotion.is_some_and(|e| e.is_negative()) || contains_any(&content, NEGATIVE_MEMORY_WORDS)
        {
            return vote(
                "remember_negative",
                format!("Last time didn't go well: {snippet}"),
                0.8,
            );
        }
        if emotion.is_some_and(|e| e.is_positive()) || contains_any(&content, POSITIVE_MEMORY_WORDS)
        {
            return vote(
                "remember_positive",
                format!("I remember this was nice: {snippet}"),
                0.8,
            );
        }
        return vote(
            "remember_neutral",
            format!("Something like this happened before: {snippet}"),
            0.6,
        );
    }

    let words: Vec<String> = tokenize(s).into_iter().filter(|w| w.len() >= 3).collect();
    let echoes_recent = ctx.recent_interactions.iter().any(|past| {
        let past = tokenize(past);
        words.iter().any(|w| past.contains(w))
    });
    if echoes_recent {
        return vote(
            "remember_neutral",
            "This feels like something we did just a moment ago.".to_string(),
            0.5,
        );
    }

    if ctx.relationship.bond > 50.0 {
        vote(
            "trust_pattern",
            "I don't remember anything like this, but my trainer has always looked after me."
                .to_string(),
            0.6,
        )
    } else {
        vote(
            "no_pattern",
            "I don't remember anything like this.".to_string(),
            0.4,
        )
    }
}

fn needs(s: &str, ctx: &Context) -> Vote {
    const EW: f32 = 0.2;
    let p = &ctx.physical;
    let vote = |d: &str, r: &str, c: f32| Vote::new(AgentKind::Needs, d, r, c, EW);

    if contains_any(s, &["food", "eat", "berry"]) {
        if p.hunger > 50.0 {
            vote("urgent_need", "So hungry! Food is exactly what I need!", 0.95)
        } else {
            vote("accept", "I could eat something.", 0.7)
        }
    } else if contains_any(s, &["rest", "sleep", "nap"]) {
        if p.energy < 30.0 {
            vote("urgent_need", "So tired... I really need to rest.", 0.95)
        } else {
            vote("not_needed", "I'm not tired yet.", 0.6)
        }
    } else if contains_any(s, &["play", "explore"]) {
        if p.energy < 30.0 {
            vote("too_tired", "Too tired to do that right now.", 0.9)
        } else if p.hunger > 70.0 {
            vote("too_hungry", "Too hungry to focus on anything else.", 0.85)
        } else if p.health < 50.0 {
            vote("too_hurt", "I'm hurt. I shouldn't push myself.", 0.9)
        } else {
            vote("acceptable", "My body is up for it.", 0.7)
        }
    } else if p.hunger > 70.0 {
        vote("distracted_hungry", "It's hard to think with an empty stomach.", 0.7)
    } else if p.energy < 25.0 {
        vote("distracted_tired", "I'm getting sleepy...", 0.7)
    } else {
        vote("fine", "I feel fine.", 0.6)
    }
}

fn instinct(s: &str, ctx: &Context) -> Vote {
    const EW: f32 = 0.3;
    let traits = &ctx.personality;
    let vote = |d: &str, r: &str, c: f32| Vote::new(AgentKind::Instinct, d, r, c, EW);

    if s.contains("play") {
        if ctx.physical.energy > 40.0 && traits.playfulness > 6.0 {
            vote("instinct_yes", "Tail wagging, ready to pounce!", 0.8)
        } else {
            vote("instinct_mild", "A small urge to join in.", 0.6)
        }
    } else if contains_any(s, &["danger", "threat"]) {
        vote("fight_or_flight", "Fur bristling, ready to bolt or fight.", 0.9)
    } else if s.contains("trainer") {
        vote("bond_response", "Ears perk up at the trainer's voice.", 0.85)
    } else if s.contains("explore") {
        if traits.curiosity > 6.0 {
            vote("explore_instinct", "Nose twitching, new smells everywhere!", 0.7)
        } else {
            vote("cautious_instinct", "Sniffing the air carefully first.", 0.6)
        }
    } else if s.contains("food") {
        vote("approach_food", "Drawn toward the smell of food.", 0.8)
    } else {
        vote("observe", "Watching quietly, ears alert.", 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{EventType, MemoryRecord};
    use crate::retrieval::RecallSource;
    use crate::types::{Emotion, PhysicalState, Relationship};

    fn agent(kind: AgentKind) -> Agent {
        Agent::panel(&CouncilConfig::default())
            .into_iter()
            .find(|a| a.kind() == kind)
            .expect("agent in panel")
    }

    fn physical(hunger: f32, energy: f32, health: f32, happiness: f32) -> PhysicalState {
        PhysicalState {
            hunger,
            energy,
            health,
            happiness,
        }
    }

    fn recalled(content: &str, emotion: Option<Emotion>) -> RecalledMemory {
        RecalledMemory {
            record: MemoryRecord::episodic(content, 7.0, EventType::Interaction, None)
                .with_emotion(emotion, 6.0),
            relevance: 0.9,
            similarity: 0.7,
            source: RecallSource::Similarity,
        }
    }

    #[test]
    fn panel_has_five_agents_in_order_summing_to_one() {
        let panel = Agent::panel(&CouncilConfig::default());
        let kinds: Vec<_> = panel.iter().map(Agent::kind).collect();
        assert_eq!(kinds, AgentKind::ALL.to_vec());
        let sum: f32 = panel.iter().map(Agent::base_weight).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn survival_weight_rises_in_danger() {
        let a = agent(AgentKind::Survival);
        let safe = Context::default();
        let danger = Context::default().with_location("deep_forest", 3.0);
        let hurt = Context::default().with_physical(physical(40.0, 70.0, 20.0, 80.0));
        assert!((a.effective_weight(&safe) - 0.30).abs() < 1e-6);
        assert!((a.effective_weight(&danger) - 0.60).abs() < 1e-6);
        assert!((a.effective_weight(&hurt) - 0.50).abs() < 1e-6);
    }

    #[test]
    fn needs_weight_tracks_deficits() {
        let a = agent(AgentKind::Needs);
        let starving = Context::default().with_physical(physical(85.0, 70.0, 95.0, 80.0));
        let peckish = Context::default().with_physical(physical(65.0, 70.0, 95.0, 80.0));
        let sleepy = Context::default().with_physical(physical(10.0, 35.0, 95.0, 80.0));
        assert!((a.effective_weight(&starving) - 0.35).abs() < 1e-6);
        assert!((a.effective_weight(&peckish) - 0.25).abs() < 1e-6);
        assert!((a.effective_weight(&sleepy) - 0.25).abs() < 1e-6);
        assert!((a.effective_weight(&Context::default()) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn unmodulated_agents_keep_base_weight() {
        let danger = Context::default()
            .with_location("cliff", 1.0)
            .with_physical(physical(95.0, 5.0, 10.0, 10.0));
        for kind in [AgentKind::Logic, AgentKind::Recall, AgentKind::Instinct] {
            let a = agent(kind);
            assert!((a.effective_weight(&danger) - a.base_weight()).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn survival_fears_unsafe_exploration() {
        let ctx = Context::default().with_location("deep_forest", 3.0);
        let v = agent(AgentKind::Survival).analyze("explore the deep forest", &ctx, &[]);
        assert_eq!(v.decision, "fear_disagree");
        assert!(v.confidence >= 0.9);
        assert!((v.emotional_weight - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn survival_is_excited_when_safe_and_trusting() {
        let ctx = Context::default().with_relationship(Relationship {
            trust: 80.0,
            bond: 60.0,
        });
        let v = agent(AgentKind::Survival).analyze("Let's explore!", &ctx, &[]);
        assert_eq!(v.decision, "excited_agree");
        let v = agent(AgentKind::Survival).analyze("Your trainer is here", &ctx, &[]);
        assert_eq!(v.decision, "enthusiastic_yes");
    }

    #[test]
    fn logic_confidence_scales_with_trust_and_clamps() {
        let ctx = Context::default();
        let v = agent(AgentKind::Logic).analyze("explore", &ctx, &[]);
        assert_eq!(v.decision, "agree_cautiously");
        assert!((v.confidence - 0.95).abs() < 1e-6);

        let trusting = Context::default().with_relationship(Relationship {
            trust: 100.0,
            bond: 100.0,
        });
        let v = agent(AgentKind::Logic).analyze("adventure time", &trusting, &[]);
        assert!((v.confidence - 1.0).abs() < f32::EPSILON);

        let tired = Context::default().with_physical(physical(40.0, 30.0, 95.0, 80.0));
        let v = agent(AgentKind::Logic).analyze("explore", &tired, &[]);
        assert_eq!(v.decision, "suggest_rest_first");
    }

    #[test]
    fn needs_priorities_for_activity() {
        let a = agent(AgentKind::Needs);
        let tired_and_hungry = Context::default().with_physical(physical(90.0, 20.0, 95.0, 80.0));
        assert_eq!(a.analyze("play fetch", &tired_and_hungry, &[]).decision, "too_tired");
        let hungry = Context::default().with_physical(physical(75.0, 70.0, 95.0, 80.0));
        assert_eq!(a.analyze("play fetch", &hungry, &[]).decision, "too_hungry");
        assert_eq!(a.analyze("have a berry", &hungry, &[]).decision, "urgent_need");
        assert_eq!(a.analyze("look at the sky", &hungry, &[]).decision, "distracted_hungry");
        assert_eq!(a.analyze("time to nap", &Context::default(), &[]).decision, "not_needed");
    }

    #[test]
    fn instinct_rules() {
        let a = agent(AgentKind::Instinct);
        let ctx = Context::default();
        assert_eq!(a.analyze("play", &ctx, &[]).decision, "instinct_yes");
        assert_eq!(a.analyze("a threat approaches", &ctx, &[]).decision, "fight_or_flight");
        assert_eq!(a.analyze("explore", &ctx, &[]).decision, "explore_instinct");
        assert_eq!(a.analyze("hmm", &ctx, &[]).decision, "observe");
    }

    #[test]
    fn recall_uses_best_memory() {
        let a = agent(AgentKind::Recall);
        let ctx = Context::default();
        let scary = [recalled("The forest was dangerous", None)];
        assert_eq!(a.analyze("forest", &ctx, &scary).decision, "remember_negative");
        let happy = [recalled("We played by the lake", Some(Emotion::Joy))];
        assert_eq!(a.analyze("lake", &ctx, &happy).decision, "remember_positive");
        let unsafe_spot = [recalled("The bridge felt unsafe", None)];
        assert_eq!(a.analyze("bridge", &ctx, &unsafe_spot).decision, "remember_negative");
        let plain = [recalled("We walked", None)];
        let v = a.analyze("walk", &ctx, &plain);
        assert_eq!(v.decision, "remember_neutral");
        assert!((v.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn recall_falls_back_to_recent_then_bond() {
        let a = agent(AgentKind::Recall);
        let recent = Context::default().with_recent(vec!["we chased butterflies".to_string()]);
        assert_eq!(
            a.analyze("more butterflies!", &recent, &[]).decision,
            "remember_neutral"
        );

        assert_eq!(a.analyze("hello", &Context::default(), &[]).decision, "no_pattern");
        let bonded = Context::default().with_relationship(Relationship {
            trust: 50.0,
            bond: 70.0,
        });
        assert_eq!(a.analyze("hello", &bonded, &[]).decision, "trust_pattern");
    }
}
