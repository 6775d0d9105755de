//! # kindred-llm — Text Generation for Kindred
//!
//! Turns a council decision into words. Two backends are supported:
//!   - **OpenAI-compatible API** (`/v1/chat/completions`)
//!   - **Ollama** (`/api/generate`, local)
//!
//! Generation never fails from the companion's point of view: a missing
//! key, an unreachable backend, a bad status or an empty completion all
//! end in a canned keyword reply from [`fallback`].
//!
//! # Architecture
//!
//! ```text
//! PromptEngine ──render──▶ GenerationRequest ──▶ TextGenerator
//!                                                   │
//!                                    LlmClient (retries) ──err──▶ fallback
//! ```

pub mod client;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod prompt;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::LlmError;
pub use fallback::fallback_response;
pub use generator::TextGenerator;
pub use prompt::{PromptEngine, PromptId};
pub use types::{GeneratedText, GenerationRequest, GenerationResponse, TextSource};
