//! One companion, talking to one trainer.
//!
//! ```text
//! input ─▶ Context ─▶ retrieve ─▶ Council ─▶ appraise ─▶ prompt ─▶ generate
//!                                                                    │
//!            consolidate ◀── working memory ◀────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use kindred_core::config::KindredConfig;
use kindred_core::memory::WorkingMemory;
use kindred_core::retrieval::format_for_context;
use kindred_core::{
    Council, Decision, Interaction, MemoryConsolidator, MemoryRecord, MemoryRetriever,
    MemoryStore,
};
use kindred_llm::{PromptEngine, PromptId, TextGenerator, TextSource};

use crate::error::Result;
use crate::state::CompanionState;

/// What one call to [`Companion::interact`] produced.
#[derive(Debug, Clone)]
pub struct InteractionOutcome {
    /// What the companion said.
    pub response: String,
    /// Whether a model or the fallback wrote the response.
    pub source: TextSource,
    /// The council's verdict.
    pub decision: Decision,
    /// Long-term memories formed from the exchange.
    pub memories: Vec<MemoryRecord>,
}

/// A live companion session.
pub struct Companion {
    state: CompanionState,
    council: Council,
    consolidator: MemoryConsolidator,
    working: WorkingMemory,
    generator: TextGenerator,
    prompts: PromptEngine,
    store: Arc<dyn MemoryStore>,
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("name", &self.state.name)
            .field("working_memory", &self.working.len())
            .finish_non_exhaustive()
    }
}

impl Companion {
    /// Assemble a session around a shared store.
    #[must_use]
    pub fn new(
        config: &KindredConfig,
        store: Arc<dyn MemoryStore>,
        generator: TextGenerator,
        state: CompanionState,
    ) -> Self {
        let retriever = MemoryRetriever::new(store.clone(), &config.memory);
        Self {
            state,
            council: Council::new(&config.council).with_retriever(retriever),
            consolidator: MemoryConsolidator::new(store.clone(), &config.memory),
            working: WorkingMemory::new(config.memory.working_memory_capacity),
            generator,
            prompts: PromptEngine::builtin(),
            store,
        }
    }

    /// Use a different prompt set.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptEngine) -> Self {
        self.prompts = prompts;
        self
    }

    /// The companion's current state.
    #[must_use]
    pub fn state(&self) -> &CompanionState {
        &self.state
    }

    /// Mutable access to the state, e.g. to move or feed the companion.
    pub fn state_mut(&mut self) -> &mut CompanionState {
        &mut self.state
    }

    /// The short-term buffer.
    #[must_use]
    pub fn working_memory(&self) -> &WorkingMemory {
        &self.working
    }

    /// The long-term store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// The council.
    #[must_use]
    pub fn council(&self) -> &Council {
        &self.council
    }

    /// The consolidator, for pattern inspection.
    #[must_use]
    pub fn consolidator(&self) -> &MemoryConsolidator {
        &self.consolidator
    }

    /// Respond to the trainer.
    ///
    /// # Errors
    ///
    /// Fails only if the council cannot reach a decision or the prompt set
    /// lacks the council template. Storage and generation problems are
    /// logged and absorbed.
    pub async fn interact(&mut self, input: &str) -> Result<InteractionOutcome> {
        self.interact_at(input, Utc::now()).await
    }

    /// [`Self::interact`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Self::interact`].
    pub async fn interact_at(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<InteractionOutcome> {
        let ctx = self
            .state
            .to_context(self.working.recent(self.working.capacity()));

        let recalled = self
            .council
            .retriever()
            .map(|r| r.retrieve_relevant_at(input, &ctx, now))
            .unwrap_or_default();
        let decision = self.council.deliberate_with(input, &ctx, &recalled)?;

        let mood = decision.dominant_emotion();
        let intensity = (decision.winner.emotional_weight * 10.0).clamp(0.0, 10.0);
        debug!(mood = %mood, intensity, "Appraised interaction");
        let ctx = ctx
            .with_emotion(mood.emotion(), intensity)
            .with_decision(decision.clone());

        let happiness = format!("{:.0}", ctx.physical.happiness);
        let energy = format!("{:.0}", ctx.physical.energy);
        let hunger = format!("{:.0}", ctx.physical.hunger);
        let memories = format_for_context(&recalled, true);
        let recent = self.working.to_context_string();
        let request = self.prompts.request(
            PromptId::CouncilResponse,
            &[
                ("name", self.state.name.as_str()),
                ("situation", input),
                ("decision", decision.winner.decision.as_str()),
                ("reasoning", decision.winner.reasoning.as_str()),
                ("emotion", mood.as_str()),
                ("happiness", happiness.as_str()),
                ("energy", energy.as_str()),
                ("hunger", hunger.as_str()),
                ("memories", memories.as_str()),
                ("recent", recent.as_str()),
            ],
        )?
        .with_fallback_key(input);
        let generated = self.generator.generate_request(&request).await;

        self.working.add(format!("Trainer: {input}"));
        self.working
            .add(format!("{}: {}", self.state.name, generated.text));

        let formed = self
            .consolidator
            .process_interaction(
                &Interaction::new(input, generated.text.clone()).at(now),
                &ctx,
                Some(&decision),
            )
            .unwrap_or_default();
        self.state.last_interaction = Some(now);

        info!(
            companion = %self.state.name,
            decision = %decision.winner.decision,
            mood = %mood,
            source = ?generated.source,
            memories = formed.len(),
            "Interaction complete"
        );

        Ok(InteractionOutcome {
            response: generated.text,
            source: generated.source,
            decision,
            memories: formed,
        })
    }

    /// How the companion greets the trainer after `hours` apart.
    #[must_use]
    pub fn greeting(&self, hours: f64) -> String {
        let name = &self.state.name;
        if hours < 0.1 {
            format!("*{name} looks up at you* Hm? *tilts head curiously*")
        } else if hours < 2.0 {
            format!("*{name} perks up* Oh, hi! *tail wagging*")
        } else if hours < 12.0 {
            if self.state.physical.happiness > 70.0 {
                format!("*{name} bounds towards you excitedly* You're back! *jumps up happily*")
            } else {
                format!("*{name} walks over slowly* Hi... *nuzzles your hand*")
            }
        } else if hours < 48.0 {
            format!("*{name} sprints towards you* YOU'RE HERE! *tackles you with enthusiasm*")
        } else {
            format!(
                "*{name} stands frozen for a moment, ears up* ...!! *races towards you at full speed* \
                 I missed you so much! *won't stop nuzzling you*"
            )
        }
    }

    /// Greeting based on the time since the last interaction. A first
    /// meeting is treated like a long absence.
    #[must_use]
    pub fn greeting_now(&self, now: DateTime<Utc>) -> String {
        self.greeting(self.state.hours_since_last(now).unwrap_or(f64::INFINITY))
    }

    /// One sentence on how the companion seems.
    #[must_use]
    pub fn mood_description(&self) -> String {
        self.state.mood_description()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::council::{AgentKind, Mood};
    use kindred_core::memory::MemoryType;
    use kindred_core::store::InMemoryStore;
    use kindred_core::Emotion;

    fn companion() -> Companion {
        Companion::new(
            &KindredConfig::default(),
            Arc::new(InMemoryStore::default()),
            TextGenerator::offline(),
            CompanionState::default(),
        )
    }

    #[tokio::test]
    async fn offline_interaction_uses_fallback() {
        let mut pip = companion();
        let out = pip.interact("Hello there!").await.expect("interact");
        assert_eq!(out.source, TextSource::Fallback);
        assert!(!out.response.is_empty());
        assert_eq!(out.decision.votes.len(), AgentKind::ALL.len());
        assert_eq!(pip.working_memory().len(), 2);
        assert!(pip.state().last_interaction.is_some());
    }

    #[tokio::test]
    async fn frightening_place_is_refused_and_remembered() {
        let mut pip = companion();
        pip.state_mut().move_to("deep_forest", 3.0);
        let out = pip.interact("let's explore the deep forest").await.expect("interact");
        assert_eq!(out.decision.winner.decision, "fear_disagree");
        assert_eq!(out.decision.dominant_emotion(), Mood::Fearful);

        // 5 base + 2 very intense + 1 fear + 1 danger = 9, above the threshold.
        let kinds: Vec<MemoryType> = out.memories.iter().map(MemoryRecord::memory_type).collect();
        assert!(kinds.contains(&MemoryType::Episodic));
        assert!(kinds.contains(&MemoryType::Emotional));
        let episodic = out
            .memories
            .iter()
            .find(|m| m.memory_type() == MemoryType::Episodic)
            .expect("episodic");
        assert_eq!(episodic.primary_emotion, Some(Emotion::Fear));
        assert_eq!(episodic.location.as_deref(), Some("deep_forest"));
    }

    #[tokio::test]
    async fn later_conversation_recalls_the_fright() {
        let mut pip = companion();
        pip.state_mut().move_to("deep_forest", 3.0);
        pip.interact("let's explore the deep forest").await.expect("first");

        pip.state_mut().move_to("trainer_home", 10.0);
        let out = pip.interact("the deep forest again?").await.expect("second");
        let recall = out
            .decision
            .votes
            .iter()
            .find(|v| v.agent == AgentKind::Recall)
            .expect("recall vote");
        assert_eq!(recall.decision, "remember_negative");
    }

    #[test]
    fn greeting_bands() {
        let mut pip = companion();
        assert!(pip.greeting(0.05).contains("tilts head"));
        assert!(pip.greeting(1.0).contains("perks up"));
        assert!(pip.greeting(6.0).contains("bounds"));
        pip.state_mut().physical.happiness = 40.0;
        assert!(pip.greeting(6.0).contains("walks over slowly"));
        assert!(pip.greeting(30.0).contains("sprints"));
        assert!(pip.greeting(100.0).contains("missed you"));
        assert_eq!(pip.greeting_now(Utc::now()), pip.greeting(100.0));
    }
}
