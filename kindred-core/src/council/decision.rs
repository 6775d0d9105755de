//! Vote aggregation: weighted scoring, consensus and the decision summary.
//!
//! Score per vote:
//!   score = weight × confidence × (1 + emotional_weight × 0.5)
//!
//! Consensus combines how far the winner is ahead of the runner-up with how
//! many votes fall into the winner's agreement group:
//!   consensus = clamp((1 − second/top) × 0.6 + agreeing/total × 0.4, 0, 1)

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::council::agents::AgentKind;
use crate::error::{KindredError, Result};
use crate::significance::contains_any;
use crate::types::Emotion;

/// Extra score multiplier per unit of emotional weight.
const EMOTIONAL_AMPLIFIER: f32 = 0.5;

/// Below this consensus the summary mentions a disagreeing runner-up.
const DISSENT_THRESHOLD: f32 = 0.7;

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

/// One agent's proposal for how to react.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Which agent cast the vote.
    pub agent: AgentKind,
    /// Short decision label (e.g. `"fear_disagree"`).
    pub decision: String,
    /// Why the agent voted this way.
    pub reasoning: String,
    /// How sure the agent is (0–1).
    pub confidence: f32,
    /// How emotionally charged the vote is (0–1).
    pub emotional_weight: f32,
}

impl Vote {
    /// Create a vote, clamping confidence and emotional weight to `[0, 1]`.
    #[must_use]
    pub fn new(
        agent: AgentKind,
        decision: impl Into<String>,
        reasoning: impl Into<String>,
        confidence: f32,
        emotional_weight: f32,
    ) -> Self {
        Self {
            agent,
            decision: decision.into(),
            reasoning: reasoning.into(),
            confidence: clamp_unit(confidence),
            emotional_weight: clamp_unit(emotional_weight),
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Agreement groups
// ---------------------------------------------------------------------------

/// Coarse families of decision labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgreementGroup {
    /// Going along with it.
    Positive,
    /// Refusing.
    Negative,
    /// Hesitating.
    Cautious,
}

impl AgreementGroup {
    /// Every group.
    pub const ALL: [Self; 3] = [Self::Positive, Self::Negative, Self::Cautious];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Positive => &["agree", "yes", "enthusiastic", "excited", "joyful", "accept"],
            Self::Negative => &["disagree", "no", "protest", "fear", "too_"],
            Self::Cautious => &["cautious", "careful", "maybe", "consider"],
        }
    }

    /// Whether a label belongs to this group (substring match).
    #[must_use]
    pub fn matches(self, label: &str) -> bool {
        contains_any(&label.to_lowercase(), self.keywords())
    }

    /// Two labels agree when some group contains both.
    #[must_use]
    pub fn agree(a: &str, b: &str) -> bool {
        Self::ALL.into_iter().any(|g| g.matches(a) && g.matches(b))
    }
}

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// The feeling that colours a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Happy, excited.
    Joyful,
    /// Scared.
    Fearful,
    /// Down or lonely.
    Sad,
    /// Annoyed.
    Frustrated,
    /// Interested.
    Curious,
    /// Wary.
    Cautious,
    /// Nothing stands out.
    Calm,
}

impl Mood {
    const RULES: [(Self, &'static [&'static str]); 6] = [
        (Self::Joyful, &["joy", "happy", "excited"]),
        (Self::Fearful, &["fear", "scary", "afraid"]),
        (Self::Sad, &["sad", "lonely"]),
        (Self::Frustrated, &["angry", "frustrated"]),
        (Self::Curious, &["curious", "interested"]),
        (Self::Cautious, &["cautious", "nervous"]),
    ];

    fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::RULES
            .iter()
            .find(|(_, words)| contains_any(&lower, words))
            .map(|(mood, _)| *mood)
    }

    /// Lowercase adjective.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Joyful => "joyful",
            Self::Fearful => "fearful",
            Self::Sad => "sad",
            Self::Frustrated => "frustrated",
            Self::Curious => "curious",
            Self::Cautious => "cautious",
            Self::Calm => "calm",
        }
    }

    /// The emotion this mood corresponds to.
    #[must_use]
    pub fn emotion(self) -> Emotion {
        match self {
            Self::Joyful => Emotion::Joy,
            Self::Fearful => Emotion::Fear,
            Self::Sad => Emotion::Sadness,
            Self::Frustrated => Emotion::Anger,
            Self::Curious => Emotion::Curiosity,
            Self::Cautious => Emotion::Anticipation,
            Self::Calm => Emotion::Contentment,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// The council's resolved verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// The highest-scoring vote.
    pub winner: Vote,
    /// All votes, highest score first.
    pub votes: Vec<Vote>,
    /// Weighted score per agent. If votes passed straight to
    /// [`DecisionEngine::resolve_votes`] repeat a kind, the highest score
    /// for that kind is kept.
    pub scores: BTreeMap<AgentKind, f32>,
    /// Agreement across votes (0–1).
    pub consensus: f32,
    /// Human-readable summary.
    pub summary: String,
}

impl Decision {
    /// Mood of the most emotionally charged vote.
    ///
    /// The decision label is checked first, then the reasoning.
    #[must_use]
    pub fn dominant_emotion(&self) -> Mood {
        dominant_emotion(&self.votes)
    }

    /// How sure the council is, in words.
    #[must_use]
    pub fn confidence_label(&self) -> &'static str {
        confidence_label(self.consensus)
    }

    /// How the deliberation felt from the inside.
    #[must_use]
    pub fn internal_state(&self) -> &'static str {
        match self.consensus {
            c if c > 0.8 => "certain and clear",
            c if c > 0.6 => "mostly clear",
            c if c > 0.4 => "somewhat conflicted",
            _ => "very conflicted and uncertain",
        }
    }

    /// The winner's weighted score.
    #[must_use]
    pub fn winning_score(&self) -> f32 {
        self.scores.get(&self.winner.agent).copied().unwrap_or(0.0)
    }

    /// One line per vote with its score, followed by the outcome.
    #[must_use]
    pub fn debate_report(&self) -> String {
        let mut out = String::from("Council debate:\n");
        for vote in &self.votes {
            let score = self.scores.get(&vote.agent).copied().unwrap_or(0.0);
            let _ = writeln!(
                out,
                "  {:<9} {:<20} score {:.3}  confidence {:.2}  emotion {:.2}  ({})",
                vote.agent.name(),
                vote.decision,
                score,
                vote.confidence,
                vote.emotional_weight,
                vote.reasoning,
            );
        }
        let _ = write!(
            out,
            "Winner: {} ({}) | consensus {:.2}, {}",
            self.winner.agent.name(),
            self.winner.decision,
            self.consensus,
            self.confidence_label(),
        );
        out
    }
}

/// Mood of the vote with the highest emotional weight (first on ties).
#[must_use]
pub fn dominant_emotion(votes: &[Vote]) -> Mood {
    let mut strongest: Option<&Vote> = None;
    for vote in votes {
        if strongest.is_none_or(|s| vote.emotional_weight > s.emotional_weight) {
            strongest = Some(vote);
        }
    }
    strongest
        .and_then(|v| Mood::from_text(&v.decision).or_else(|| Mood::from_text(&v.reasoning)))
        .unwrap_or(Mood::Calm)
}

/// Words for a consensus level.
#[must_use]
pub fn confidence_label(consensus: f32) -> &'static str {
    match consensus {
        c if c > 0.8 => "very confident",
        c if c > 0.6 => "confident",
        c if c > 0.4 => "somewhat confident",
        _ => "uncertain",
    }
}

// ---------------------------------------------------------------------------
// DecisionEngine
// ---------------------------------------------------------------------------

/// Resolves weighted votes into a [`Decision`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    /// Create an engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Weighted score of one vote.
    #[must_use]
    pub fn score(vote: &Vote, weight: f32) -> f32 {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        weight * vote.confidence * (1.0 + vote.emotional_weight * EMOTIONAL_AMPLIFIER)
    }

    /// Resolve `(vote, effective weight)` pairs into a decision.
    ///
    /// Votes are ranked by score, highest first; ties keep their input order.
    ///
    /// # Errors
    /// Returns [`KindredError::EmptyVotes`] if `votes` is empty.
    pub fn resolve_votes(&self, votes: Vec<(Vote, f32)>) -> Result<Decision> {
        if votes.is_empty() {
            return Err(KindredError::EmptyVotes);
        }

        let mut scored: Vec<(Vote, f32)> = votes
            .into_iter()
            .map(|(vote, weight)| {
                let score = Self::score(&vote, weight);
                (vote, score)
            })
            .collect();
        // Stable: equal scores stay in panel order.
        scored.sort_by_key(|(_, score)| Reverse(OrderedFloat(*score)));

        let mut scores = BTreeMap::new();
        for (vote, score) in &scored {
            scores.entry(vote.agent).or_insert(*score);
        }

        let consensus = Self::consensus(&scored);
        let summary = Self::summarize(&scored, consensus);
        let votes: Vec<Vote> = scored.into_iter().map(|(vote, _)| vote).collect();
        let winner = votes[0].clone();

        debug!(
            winner = %winner.agent,
            decision = %winner.decision,
            consensus,
            votes = votes.len(),
            "Council reached a decision"
        );

        Ok(Decision {
            winner,
            votes,
            scores,
            consensus,
            summary,
        })
    }

    /// Consensus of score-sorted votes.
    #[allow(clippy::cast_precision_loss)]
    fn consensus(scored: &[(Vote, f32)]) -> f32 {
        if scored.len() < 2 {
            return 1.0;
        }
        let top = scored[0].1;
        if top <= 0.0 {
            return 0.5;
        }
        let ratio = 1.0 - scored[1].1 / top;
        let winner = &scored[0].0.decision;
        let agreeing = scored
            .iter()
            .filter(|(vote, _)| AgreementGroup::agree(winner, &vote.decision))
            .count();
        let agreement = agreeing as f32 / scored.len() as f32;
        (ratio * 0.6 + agreement * 0.4).clamp(0.0, 1.0)
    }

    fn summarize(scored: &[(Vote, f32)], consensus: f32) -> String {
        let winner = &scored[0].0;
        let tone = match consensus {
            c if c > 0.8 => "The council unanimously agrees:",
            c if c > 0.6 => "The council generally agrees:",
            c if c > 0.4 => "The council is leaning towards:",
            _ => "After debate, the council decides:",
        };
        let mut summary = format!(
            "{tone} {}\nPrimary reasoning: {}",
            winner.decision, winner.reasoning
        );
        if consensus < DISSENT_THRESHOLD {
            if let Some((runner_up, _)) = scored.get(1) {
                if !AgreementGroup::agree(&winner.decision, &runner_up.decision) {
                    let _ = write!(
                        summary,
                        "\n(Note: {} suggests: {})",
                        runner_up.agent.name(),
                        runner_up.decision
                    );
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(agent: AgentKind, decision: &str, confidence: f32, emotional: f32) -> Vote {
        Vote::new(agent, decision, format!("{decision} because"), confidence, emotional)
    }

    #[test]
    fn empty_votes_is_an_error() {
        let err = DecisionEngine::new().resolve_votes(Vec::new()).expect_err("empty");
        assert!(matches!(err, KindredError::EmptyVotes));
    }

    #[test]
    fn score_formula() {
        let v = vote(AgentKind::Survival, "fear_disagree", 0.9, 1.0);
        assert!((DecisionEngine::score(&v, 0.6) - 0.6 * 0.9 * 1.5).abs() < 1e-6);
        assert!(DecisionEngine::score(&v, f32::NAN).abs() < f32::EPSILON);
    }

    #[test]
    fn single_vote_is_unanimous() {
        let d = DecisionEngine::new()
            .resolve_votes(vec![(vote(AgentKind::Logic, "agree", 0.8, 0.3), 0.25)])
            .expect("decision");
        assert!((d.consensus - 1.0).abs() < f32::EPSILON);
        assert!(d.summary.starts_with("The council unanimously agrees: agree"));
    }

    #[test]
    fn highest_score_wins() {
        let d = DecisionEngine::new()
            .resolve_votes(vec![
                (vote(AgentKind::Logic, "agree_cautiously", 0.95, 0.3), 0.25),
                (vote(AgentKind::Survival, "fear_disagree", 0.9, 1.0), 0.6),
                (vote(AgentKind::Instinct, "explore_instinct", 0.7, 0.3), 0.1),
            ])
            .expect("decision");
        assert_eq!(d.winner.agent, AgentKind::Survival);
        assert_eq!(d.votes[0].agent, AgentKind::Survival);
        assert_eq!(d.votes.len(), 3);
        assert!(d.scores[&AgentKind::Survival] > d.scores[&AgentKind::Logic]);
    }

    #[test]
    fn ties_keep_panel_order() {
        let d = DecisionEngine::new()
            .resolve_votes(vec![
                (vote(AgentKind::Recall, "no_pattern", 0.5, 0.0), 0.2),
                (vote(AgentKind::Needs, "fine", 0.5, 0.0), 0.2),
            ])
            .expect("decision");
        assert_eq!(d.winner.agent, AgentKind::Recall);
    }

    #[test]
    fn zero_top_score_gives_half_consensus() {
        let d = DecisionEngine::new()
            .resolve_votes(vec![
                (vote(AgentKind::Logic, "agree", 0.0, 0.0), 0.25),
                (vote(AgentKind::Needs, "fine", 0.0, 0.0), 0.15),
            ])
            .expect("decision");
        assert!((d.consensus - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn agreement_groups() {
        assert!(AgreementGroup::agree("joyful_yes", "agree"));
        assert!(AgreementGroup::agree("too_tired", "fear_disagree"));
        assert!(AgreementGroup::agree("cautious_maybe", "consider_options"));
        assert!(!AgreementGroup::agree("observe", "observe"));
        assert!(!AgreementGroup::agree("sad_protest", "accept"));
    }

    #[test]
    fn consensus_mixes_margin_and_agreement() {
        // Scores 0.4 and 0.2: ratio 0.5. Both positive: agreement 1.0.
        let d = DecisionEngine::new()
            .resolve_votes(vec![
                (vote(AgentKind::Logic, "agree", 0.4, 0.0), 1.0),
                (vote(AgentKind::Survival, "joyful_yes", 0.2, 0.0), 1.0),
            ])
            .expect("decision");
        assert!((d.consensus - (0.5 * 0.6 + 0.4)).abs() < 1e-6);
        assert!(d.summary.starts_with("The council generally agrees:"));
    }

    #[test]
    fn dissent_is_noted_when_split() {
        let d = DecisionEngine::new()
            .resolve_votes(vec![
                (vote(AgentKind::Logic, "agree", 0.5, 0.0), 1.0),
                (vote(AgentKind::Survival, "sad_protest", 0.5, 0.0), 1.0),
            ])
            .expect("decision");
        // ratio 0, agreement 1/2 -> 0.2
        assert!((d.consensus - 0.2).abs() < 1e-6);
        assert!(d.summary.starts_with("After debate, the council decides: agree"));
        assert!(d.summary.contains("(Note: Survival suggests: sad_protest)"));
        assert_eq!(d.confidence_label(), "uncertain");
        assert_eq!(d.internal_state(), "very conflicted and uncertain");
    }

    #[test]
    fn dominant_emotion_follows_most_emotional_vote() {
        let votes = vec![
            vote(AgentKind::Logic, "agree", 0.9, 0.3),
            vote(AgentKind::Survival, "fear_disagree", 0.9, 1.0),
            vote(AgentKind::Recall, "remember_positive", 0.8, 0.4),
        ];
        assert_eq!(dominant_emotion(&votes), Mood::Fearful);
        assert_eq!(dominant_emotion(&[]), Mood::Calm);
        let calm = vec![Vote::new(AgentKind::Needs, "fine", "All good", 0.6, 0.2)];
        assert_eq!(dominant_emotion(&calm), Mood::Calm);
    }

    #[test]
    fn dominant_emotion_falls_back_to_reasoning() {
        let votes = vec![Vote::new(
            AgentKind::Survival,
            "enthusiastic_yes",
            "My trainer! I'm so happy!",
            0.95,
            1.0,
        )];
        assert_eq!(dominant_emotion(&votes), Mood::Joyful);
    }

    #[test]
    fn labels_by_band() {
        assert_eq!(confidence_label(0.95), "very confident");
        assert_eq!(confidence_label(0.7), "confident");
        assert_eq!(confidence_label(0.5), "somewhat confident");
        assert_eq!(confidence_label(0.1), "uncertain");
    }

    #[test]
    fn vote_clamps_inputs() {
        let v = Vote::new(AgentKind::Logic, "agree", "", 1.2, -0.5);
        assert!((v.confidence - 1.0).abs() < f32::EPSILON);
        assert!(v.emotional_weight.abs() < f32::EPSILON);
    }

    #[test]
    fn debate_report_lists_every_vote() {
        let d = DecisionEngine::new()
            .resolve_votes(vec![
                (vote(AgentKind::Logic, "agree", 0.8, 0.3), 0.25),
                (vote(AgentKind::Needs, "fine", 0.6, 0.2), 0.15),
            ])
            .expect("decision");
        let report = d.debate_report();
        assert!(report.contains("Logic"));
        assert!(report.contains("Needs"));
        assert!(report.contains("Winner: Logic (agree)"));
    }
}
