//! # Kindred Core Library
//!
//! The mind of a virtual companion: a council of agents that argue over
//! every situation, and a tiered long-term memory that decides what is
//! worth remembering, what to recall and what to let fade.
//!
//! - **Council**: five weighted agents vote; the strongest vote wins
//! - **Significance**: a 0–10 score gating long-term memory
//! - **Consolidation**: episodic, semantic, emotional and procedural memories
//! - **Retrieval**: similarity, location and emotion queries, ranked by relevance
//! - **Decay**: strength fades unless the memory was significant
//!
//! Storage sits behind [`store::MemoryStore`]; an in-process store and a
//! `SQLite` store are provided.
//!
//! ## Concurrency
//!
//! One deliberation cycle is synchronous. The store serialises its own
//! updates, so a decay pass may run on another thread while the companion
//! is talking.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod consolidation;
pub mod context;
pub mod council;
pub mod decay;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod retrieval;
pub mod significance;
pub mod store;
pub mod types;

pub use config::KindredConfig;
pub use consolidation::{Interaction, MemoryConsolidator};
pub use context::Context;
pub use council::{Council, Decision};
pub use decay::{DecayManager, DecayReport};
pub use error::KindredError;
pub use memory::{MemoryRecord, MemoryType};
pub use retrieval::{MemoryRetriever, RecalledMemory};
pub use significance::SignificanceScorer;
pub use store::MemoryStore;
pub use types::*;
