//! The decision council.
//!
//! One deliberation cycle:
//!
//! 1. if the panel has a memory-facing agent, ask the retriever for
//!    relevant memories
//! 2. every agent votes, in panel order
//! 3. each vote is paired with its agent's effective weight
//! 4. [`DecisionEngine::resolve_votes`] picks the winner
//!
//! Agents never see each other's votes.

pub mod agents;
pub mod decision;

use tracing::{debug, info, warn};

use crate::config::CouncilConfig;
use crate::context::Context;
use crate::error::Result;
use crate::retrieval::{MemoryRetriever, RecalledMemory};

pub use agents::{Agent, AgentKind};
pub use decision::{AgreementGroup, Decision, DecisionEngine, Mood, Vote};

/// The panel of agents plus the engine that weighs their votes.
#[derive(Debug)]
pub struct Council {
    agents: Vec<Agent>,
    engine: DecisionEngine,
    retriever: Option<MemoryRetriever>,
}

impl Council {
    /// The standard five-agent panel, without memory access.
    #[must_use]
    pub fn new(config: &CouncilConfig) -> Self {
        Self::from_agents(Agent::panel(config))
    }

    /// A council with an arbitrary panel. An empty panel is allowed but
    /// every deliberation on it fails. Each kind sits on the panel once;
    /// later agents of a kind already seated are dropped.
    #[must_use]
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        let mut seated: Vec<Agent> = Vec::with_capacity(agents.len());
        for agent in agents {
            if seated.iter().any(|a| a.kind() == agent.kind()) {
                warn!(agent = %agent.kind(), "Duplicate agent kind dropped from panel");
                continue;
            }
            seated.push(agent);
        }
        Self {
            agents: seated,
            engine: DecisionEngine::new(),
            retriever: None,
        }
    }

    /// Give the Recall agent access to long-term memory.
    #[must_use]
    pub fn with_retriever(mut self, retriever: MemoryRetriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// The agents, in panel order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The attached retriever, if any.
    #[must_use]
    pub fn retriever(&self) -> Option<&MemoryRetriever> {
        self.retriever.as_ref()
    }

    /// Deliberate on `situation`, retrieving memories if the panel needs them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::EmptyVotes`] if the panel is empty.
    pub fn deliberate(&self, situation: &str, ctx: &Context) -> Result<Decision> {
        let recalled = match &self.retriever {
            Some(r) if self.agents.iter().any(Agent::uses_memory) => {
                r.retrieve_relevant(situation, ctx)
            }
            _ => Vec::new(),
        };
        self.deliberate_with(situation, ctx, &recalled)
    }

    /// Deliberate using memories the caller already retrieved.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KindredError::EmptyVotes`] if the panel is empty.
    pub fn deliberate_with(
        &self,
        situation: &str,
        ctx: &Context,
        recalled: &[RecalledMemory],
    ) -> Result<Decision> {
        let votes: Vec<(Vote, f32)> = self
            .agents
            .iter()
            .map(|agent| {
                let vote = agent.analyze(situation, ctx, recalled);
                let weight = agent.effective_weight(ctx);
                debug!(
                    agent = %agent.kind(),
                    decision = %vote.decision,
                    confidence = vote.confidence,
                    weight,
                    "Agent voted"
                );
                (vote, weight)
            })
            .collect();

        let decision = self.engine.resolve_votes(votes)?;
        info!(
            winner = %decision.winner.agent,
            decision = %decision.winner.decision,
            consensus = decision.consensus,
            memories = recalled.len(),
            "Deliberation complete"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::MemoryConfig;
    use crate::error::KindredError;
    use crate::memory::{EventType, MemoryRecord};
    use crate::store::{InMemoryStore, MemoryStore};
    use crate::types::{Emotion, MemoryId};

    #[test]
    fn empty_panel_fails() {
        let council = Council::from_agents(Vec::new());
        let err = council.deliberate("hello", &Context::default()).unwrap_err();
        assert!(matches!(err, KindredError::EmptyVotes));
    }

    #[test]
    fn repeated_kind_is_seated_once() {
        let modulation = CouncilConfig::default().modulation;
        let council = Council::from_agents(vec![
            Agent::new(AgentKind::Logic, 0.5, modulation.clone()),
            Agent::new(AgentKind::Needs, 0.3, modulation.clone()),
            Agent::new(AgentKind::Logic, 0.2, modulation),
        ]);
        assert_eq!(council.agents().len(), 2);
        assert!((council.agents()[0].base_weight() - 0.5).abs() < f32::EPSILON);

        let d = council.deliberate("hello there", &Context::default()).expect("decision");
        assert_eq!(d.votes.len(), d.scores.len());
    }

    #[test]
    fn every_agent_votes_once() {
        let council = Council::new(&CouncilConfig::default());
        let d = council.deliberate("hello there", &Context::default()).expect("decision");
        assert_eq!(d.votes.len(), 5);
        assert_eq!(d.scores.len(), 5);
        assert!((0.0..=1.0).contains(&d.consensus));
    }

    #[test]
    fn dangerous_forest_is_refused() {
        let council = Council::new(&CouncilConfig::default());
        let ctx = Context::default().with_location("deep_forest", 3.0);
        let d = council.deliberate("explore the deep forest", &ctx).expect("decision");
        assert_eq!(d.winner.agent, AgentKind::Survival);
        assert_eq!(d.winner.decision, "fear_disagree");
        assert_eq!(d.dominant_emotion(), Mood::Fearful);
    }

    #[test]
    fn recall_votes_from_stored_memory() {
        let store = Arc::new(InMemoryStore::default());
        let bad = MemoryRecord::episodic(
            "The river was scary and I got hurt",
            8.0,
            EventType::Exploration,
            None,
        )
        .with_emotion(Some(Emotion::Fear), 8.0);
        let id: MemoryId = bad.id;
        store.store(&bad).expect("store");

        let council = Council::new(&CouncilConfig::default())
            .with_retriever(MemoryRetriever::new(store.clone(), &MemoryConfig::default()));
        let d = council.deliberate("go to the river", &Context::default()).expect("decision");
        let recall = d
            .votes
            .iter()
            .find(|v| v.agent == AgentKind::Recall)
            .expect("recall vote");
        assert_eq!(recall.decision, "remember_negative");

        let after = store
            .get(id, crate::memory::MemoryType::Episodic)
            .expect("get")
            .expect("some");
        assert_eq!(after.access_count(), 1);
    }

    #[test]
    fn panel_without_recall_skips_retrieval() {
        let store = Arc::new(InMemoryStore::default());
        let m = MemoryRecord::episodic("a picnic", 8.0, EventType::Social, None);
        store.store(&m).expect("store");
        let config = CouncilConfig::default();
        let panel: Vec<Agent> = Agent::panel(&config)
            .into_iter()
            .filter(|a| !a.uses_memory())
            .collect();
        let council = Council::from_agents(panel)
            .with_retriever(MemoryRetriever::new(store.clone(), &MemoryConfig::default()));
        let d = council.deliberate("a picnic", &Context::default()).expect("decision");
        assert_eq!(d.votes.len(), 4);
        let after = store
            .get(m.id, crate::memory::MemoryType::Episodic)
            .expect("get")
            .expect("some");
        assert_eq!(after.access_count(), 0);
    }
}
