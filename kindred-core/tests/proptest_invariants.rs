//! Property-Based Tests for Kindred Core
//!
//! Uses `proptest` to check the scoring invariants under random inputs:
//! winners, consensus, significance, relevance and decay always stay
//! within their documented bounds.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use kindred_core::council::{AgentKind, DecisionEngine, Vote};
use kindred_core::memory::{EventType, MemoryRecord};
use kindred_core::retrieval::scoring::{self, RELEVANCE_CAP};
use kindred_core::types::{Emotion, PhysicalState};
use kindred_core::{Context, DecayManager, SignificanceScorer};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

const LABELS: &[&str] = &[
    "agree",
    "fear_disagree",
    "cautious_maybe",
    "observe",
    "joyful_yes",
    "too_tired",
    "consider_options",
];

fn arb_vote() -> impl Strategy<Value = (Vote, f32)> {
    (
        0..AgentKind::ALL.len(),
        0..LABELS.len(),
        -1.0..2.0f32,
        -1.0..2.0f32,
        0.0..1.0f32,
    )
        .prop_map(|(agent, label, confidence, emotional, weight)| {
            (
                Vote::new(AgentKind::ALL[agent], LABELS[label], "because", confidence, emotional),
                weight,
            )
        })
}

fn arb_emotion() -> impl Strategy<Value = Option<Emotion>> {
    prop_oneof![
        Just(None),
        (0..Emotion::ALL.len()).prop_map(|i| Some(Emotion::ALL[i])),
    ]
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn winner_has_the_top_score(votes in prop::collection::vec(arb_vote(), 1..8)) {
        let best = votes
            .iter()
            .map(|(v, w)| DecisionEngine::score(v, *w))
            .fold(f32::MIN, f32::max);
        let decision = DecisionEngine::new().resolve_votes(votes).expect("non-empty");
        prop_assert!((decision.winning_score() - best).abs() < 1e-5);
    }

    #[test]
    fn consensus_is_bounded(votes in prop::collection::vec(arb_vote(), 1..8)) {
        let decision = DecisionEngine::new().resolve_votes(votes).expect("non-empty");
        prop_assert!((0.0..=1.0).contains(&decision.consensus));
    }

    #[test]
    fn single_vote_is_unanimous(vote in arb_vote()) {
        let decision = DecisionEngine::new().resolve_votes(vec![vote]).expect("one vote");
        prop_assert!((decision.consensus - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ties_go_to_panel_order(confidence in 0.1..1.0f32, weight in 0.1..1.0f32) {
        let votes: Vec<(Vote, f32)> = AgentKind::ALL
            .iter()
            .map(|kind| (Vote::new(*kind, "agree", "same", confidence, 0.5), weight))
            .collect();
        let decision = DecisionEngine::new().resolve_votes(votes).expect("votes");
        prop_assert_eq!(decision.winner.agent, AgentKind::Logic);
    }
}

// ---------------------------------------------------------------------------
// Significance
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn significance_is_bounded(
        input in ".{0,80}",
        intensity in -5.0..20.0f32,
        emotion in arb_emotion(),
        hunger in 0.0..100.0f32,
        energy in 0.0..100.0f32,
        safety in 0.0..10.0f32,
    ) {
        let mut ctx = Context::default()
            .with_location("somewhere", safety)
            .with_physical(PhysicalState { hunger, energy, ..PhysicalState::default() });
        ctx.primary_emotion = emotion;
        ctx.emotion_intensity = intensity;
        let score = SignificanceScorer::new().score(&input, &ctx, None);
        prop_assert!((0.0..=10.0).contains(&score));
    }
}

// ---------------------------------------------------------------------------
// Relevance and decay
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn relevance_never_exceeds_cap(
        similarity in -1.0..1.0f32,
        significance in 0.0..10.0f32,
        strength in 0.0..1.0f32,
        age_hours in 0i64..2000,
        bonus in 0.0..0.5f32,
    ) {
        let now = Utc::now();
        let record = MemoryRecord::episodic("x", significance, EventType::Interaction, None)
            .with_strength(strength)
            .created_at(now - Duration::hours(age_hours));
        let r = scoring::relevance(&record, similarity, bonus, now);
        prop_assert!(r <= RELEVANCE_CAP);
    }

    #[test]
    fn decay_never_raises_strength(
        significance in 0.0..10.0f32,
        strength in 0.0..1.0f32,
        rate in 0.0..1.0f32,
    ) {
        let mut record = MemoryRecord::episodic("x", significance, EventType::Interaction, None)
            .with_strength(strength);
        let after = DecayManager::new(rate).apply(&mut record);
        prop_assert!(after <= strength);
        prop_assert!(after >= 0.0);
    }

    #[test]
    fn significant_memories_decay_slower(
        low in 0.0..5.0f32,
        high in 5.0..10.0f32,
        rate in 0.001..1.0f32,
    ) {
        let d = DecayManager::new(rate);
        prop_assert!(d.decay_amount(high) <= d.decay_amount(low));
    }

    #[test]
    fn access_always_reinforces(strength in 0.0..0.95f32) {
        let mut record = MemoryRecord::episodic("x", 5.0, EventType::Interaction, None)
            .with_strength(strength);
        record.mark_accessed(Utc::now());
        prop_assert!(record.strength() > strength);
        prop_assert_eq!(record.access_count(), 1);
    }
}
