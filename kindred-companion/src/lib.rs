//! # kindred-companion — A Companion Session
//!
//! Wires `kindred-core` (council, memory) and `kindred-llm` (text) into
//! one companion that a front end can talk to.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               Companion                       │
//! │  CompanionState ─▶ Context                    │
//! │        │                                      │
//! │        ▼                                      │
//! │  ┌──────────────┐   ┌──────────────────────┐  │
//! │  │ kindred-core │   │     kindred-llm      │  │
//! │  │ council      │──▶│ prompt ─▶ generator  │  │
//! │  │ memory       │◀──│                      │  │
//! │  └──────────────┘   └──────────────────────┘  │
//! └──────────────────────────────────────────────┘
//!          ▲
//!          └── decay task (tokio interval)
//! ```
//!
//! ## Modules
//!
//! - `state`: vitals, relationship, personality and location
//! - `session`: the interaction cycle, greetings and mood text
//! - `scheduler`: periodic decay passes
//! - `setup`: store and generator from configuration
//! - `telemetry`: `tracing` subscriber installation

pub mod error;
pub mod scheduler;
pub mod session;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::CompanionError;
pub use scheduler::spawn_decay_task;
pub use session::{Companion, InteractionOutcome};
pub use setup::{build_generator, open_store};
pub use state::CompanionState;
pub use telemetry::init_tracing;
