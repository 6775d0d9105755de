//! Integration Tests — End-to-End Mind Flows
//!
//! Whole-cycle scenarios: deliberate → consolidate → retrieve → decay,
//! against both store backends.

use std::sync::Arc;

use kindred_core::config::{KindredConfig, PersistenceConfig};
use kindred_core::council::{AgentKind, Council, Mood};
use kindred_core::embedding::HashingEmbeddingProvider;
use kindred_core::memory::MemoryType;
use kindred_core::store::{InMemoryStore, MemoryStore, SqliteMemoryStore};
use kindred_core::types::{Emotion, PhysicalState};
use kindred_core::{
    Context, DecayManager, Interaction, MemoryConsolidator, MemoryRetriever,
};

fn mind(store: Arc<dyn MemoryStore>) -> (Council, MemoryConsolidator) {
    let config = KindredConfig::default();
    let council = Council::new(&config.council)
        .with_retriever(MemoryRetriever::new(store.clone(), &config.memory));
    let consolidator = MemoryConsolidator::new(store, &config.memory);
    (council, consolidator)
}

// ---------------------------------------------------------------------------
// The deep forest
// ---------------------------------------------------------------------------

#[test]
fn deep_forest_is_refused_out_of_fear() {
    let config = KindredConfig::default();
    let council = Council::new(&config.council);
    let ctx = Context::default().with_location("deep_forest", 3.0);

    let survival = council
        .agents()
        .iter()
        .find(|a| a.kind() == AgentKind::Survival)
        .expect("survival agent");
    assert!((survival.effective_weight(&ctx) - 0.60).abs() < 1e-6);

    let decision = council
        .deliberate("explore the deep forest", &ctx)
        .expect("decision");
    let fear = decision
        .votes
        .iter()
        .find(|v| v.agent == AgentKind::Survival)
        .expect("survival vote");
    assert_eq!(fear.decision, "fear_disagree");
    assert!(fear.confidence >= 0.9);
    assert_eq!(decision.winner.agent, AgentKind::Survival);
    assert_eq!(decision.winner.decision, "fear_disagree");
    assert_eq!(decision.dominant_emotion(), Mood::Fearful);
}

#[test]
fn safe_meadow_with_trusted_trainer_is_welcome() {
    let config = KindredConfig::default();
    let council = Council::new(&config.council);
    let ctx = Context::default()
        .with_location("meadow", 9.0)
        .with_relationship(kindred_core::types::Relationship {
            trust: 80.0,
            bond: 70.0,
        });
    let decision = council.deliberate("let's explore the meadow", &ctx).expect("decision");
    assert_eq!(decision.winner.decision, "excited_agree");
    assert!(decision.consensus > 0.0);
}

// ---------------------------------------------------------------------------
// Lifecycle: remember → recall → forget
// ---------------------------------------------------------------------------

#[test]
fn frightening_forest_is_remembered_and_recalled() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::default());
    let (council, mut consolidator) = mind(store.clone());

    let ctx = Context::default()
        .with_location("deep_forest", 3.0)
        .with_emotion(Emotion::Fear, 8.0);
    let decision = council
        .deliberate("explore the deep forest", &ctx)
        .expect("decision");
    let created = consolidator
        .process_interaction(
            &Interaction::new("explore the deep forest", "No! It's too scary!"),
            &ctx,
            Some(&decision),
        )
        .expect("memories formed");

    let kinds: Vec<MemoryType> = created.iter().map(|m| m.memory_type()).collect();
    assert!(kinds.contains(&MemoryType::Episodic));
    assert!(kinds.contains(&MemoryType::Emotional));
    assert_eq!(store.count(None).expect("count"), created.len());

    // Later, back home and calm, the forest comes up again.
    let later = Context::default();
    let decision = council
        .deliberate("should we go back to the deep forest?", &later)
        .expect("decision");
    let recall = decision
        .votes
        .iter()
        .find(|v| v.agent == AgentKind::Recall)
        .expect("recall vote");
    assert_eq!(recall.decision, "remember_negative");
}

#[test]
fn habits_survive_a_decay_pass() {
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::default());
    let (_, mut consolidator) = mind(store.clone());
    let ctx = Context::default().with_physical(PhysicalState {
        hunger: 95.0,
        energy: 10.0,
        ..PhysicalState::default()
    });

    for _ in 0..3 {
        let _ = consolidator.process_interaction(
            &Interaction::new("want some food?", "yes!"),
            &ctx,
            None,
        );
    }
    assert_eq!(store.count(Some(MemoryType::Procedural)).expect("count"), 1);

    let report = DecayManager::new(0.05).run_pass(store.as_ref()).expect("decay");
    assert_eq!(report.examined, store.count(None).expect("count"));
    assert_eq!(report.failed, 0);
    assert_eq!(store.count(Some(MemoryType::Procedural)).expect("count"), 1);
}

#[test]
fn sqlite_lifecycle_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mind.db");
    let persistence = PersistenceConfig::default();
    let embedder = Arc::new(HashingEmbeddingProvider::default());

    let remembered = {
        let store: Arc<dyn MemoryStore> = Arc::new(
            SqliteMemoryStore::open(&path, &persistence, embedder.clone()).expect("open"),
        );
        let (_, mut consolidator) = mind(store.clone());
        let ctx = Context::default().with_emotion(Emotion::Gratitude, 9.0);
        consolidator
            .process_interaction(
                &Interaction::new("I give you my favourite berry", "Thank you!"),
                &ctx,
                None,
            )
            .expect("memories formed")
    };

    let store: Arc<dyn MemoryStore> =
        Arc::new(SqliteMemoryStore::open(&path, &persistence, embedder).expect("reopen"));
    assert_eq!(store.count(None).expect("count"), remembered.len());

    let retriever = MemoryRetriever::new(store.clone(), &KindredConfig::default().memory);
    let recalled = retriever.retrieve_relevant("favourite berry", &Context::default());
    assert!(!recalled.is_empty());
    let first = &recalled[0];
    let stored = store
        .get(first.record.id, first.record.memory_type())
        .expect("get")
        .expect("present");
    assert_eq!(stored.access_count(), 1);
}

#[test]
fn config_round_trip_drives_the_mind() {
    let toml = r#"
        [memory]
        significance_threshold = 9.5
    "#;
    let config = KindredConfig::from_toml(toml).expect("config");
    let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::default());
    let mut consolidator = MemoryConsolidator::new(store, &config.memory);
    let ctx = Context::default().with_emotion(Emotion::Joy, 8.0);
    // 5 + 2 + 1 = 8, below the raised threshold
    assert!(consolidator
        .process_interaction(&Interaction::new("hello", "hi"), &ctx, None)
        .is_none());
}
