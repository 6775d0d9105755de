//! Prompt templates for companion replies.
//!
//! Every prompt is a versioned, testable artifact. The built-in templates
//! below are the defaults; [`PromptEngine::from_directory`] loads
//! replacements from TOML files.
//!
//! User templates contain none of the fallback keywords; when no backend
//! answers, the canned reply depends only on the rendered variables.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::LlmError;
use crate::types::GenerationRequest;

/// Persona shared by every companion prompt.
pub const COMPANION_SYSTEM: &str = r"You are {name}, a curious and loyal companion who lives alongside a human friend.
Stay in character. You speak simply and warmly, and you show feelings through actions.";

/// Reply guided by the council's decision.
pub const COUNCIL_RESPONSE_USER: &str = r#"Situation: "{situation}"

Your inner decision: {decision}
Your reasoning: {reasoning}
Your emotional state: {emotion}

Current state:
- Happiness: {happiness}/100
- Energy: {energy}/100
- Hunger: {hunger}/100

Things you recall:
{memories}

Recent conversation:
{recent}

Respond naturally in the first person:
- Include body language in *asterisks*
- Show the emotion: {emotion}
- Reflect the decision: {decision}
- Keep the response to 2-4 sentences

{name}'s response:"#;

/// Reply without a council decision.
pub const SIMPLE_RESPONSE_USER: &str = r#"Current situation:
- Location: {location}
- Happiness: {happiness}/100
- Energy: {energy}/100
- Trust in your friend: {trust}/100

Your friend says: "{situation}"

Respond as {name} would:
- Include body language in *asterisks*
- Show genuine emotion and character
- React authentically based on how you feel
- Keep the response to 2-4 sentences

{name}'s response:"#;

/// One-sentence first-person summary of an interaction.
pub const MEMORY_SUMMARY_USER: &str = r"Summarize this moment from {name}'s point of view.

Interaction: {interaction}
Emotional state: {emotion}

Write one first-person sentence that captures what happened and how it felt.

Summary:";

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value. Unknown placeholders are
/// left untouched.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

// ---------------------------------------------------------------------------
// PromptEngine: versioned TOML template loader
// ---------------------------------------------------------------------------

/// Identifies a prompt template by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Reply shaped by a council decision.
    CouncilResponse,
    /// Reply without deliberation.
    SimpleResponse,
    /// Summary of an interaction for long-term storage.
    MemorySummary,
}

impl PromptId {
    /// Returns the TOML filename (without path) for this prompt.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::CouncilResponse => "council_response.toml",
            Self::SimpleResponse => "simple_response.toml",
            Self::MemorySummary => "memory_summary.toml",
        }
    }

    /// All prompt IDs.
    #[must_use]
    pub fn all() -> &'static [PromptId] {
        &[Self::CouncilResponse, Self::SimpleResponse, Self::MemorySummary]
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CouncilResponse => "council_response",
            Self::SimpleResponse => "simple_response",
            Self::MemorySummary => "memory_summary",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PromptId {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "council_response" => Ok(Self::CouncilResponse),
            "simple_response" => Ok(Self::SimpleResponse),
            "memory_summary" => Ok(Self::MemorySummary),
            _ => Err(LlmError::ConfigError(format!("unknown prompt id: '{s}'"))),
        }
    }
}

/// Inner `[prompt]` section of a TOML file.
#[derive(Debug, Clone, Deserialize)]
struct TomlPromptData {
    version: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(default)]
    stop: Vec<String>,
    system: String,
    user: String,
}

#[derive(Debug, Clone, Deserialize)]
struct TomlPromptFile {
    prompt: TomlPromptData,
}

/// A loaded, ready-to-render prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    /// Prompt version string (e.g., "1.0").
    pub version: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Stop sequences.
    pub stop: Vec<String>,
    /// System prompt template (contains `{key}` placeholders).
    pub system: String,
    /// User prompt template (contains `{key}` placeholders).
    pub user: String,
}

impl PromptTemplate {
    fn builtin(max_tokens: u32, temperature: f32, user: &str) -> Self {
        Self {
            version: "builtin".into(),
            max_tokens,
            temperature,
            stop: Vec::new(),
            system: COMPANION_SYSTEM.into(),
            user: user.into(),
        }
    }

    /// Render into a request carrying this template's sampling settings.
    #[must_use]
    pub fn request(&self, vars: &[(&str, &str)]) -> GenerationRequest {
        GenerationRequest::new(render_template(&self.user, vars))
            .with_system(render_template(&self.system, vars))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_stop(self.stop.clone())
    }
}

/// Engine that loads versioned TOML prompt templates and renders them.
///
/// # Example
///
/// ```
/// use kindred_llm::prompt::{PromptEngine, PromptId};
///
/// let engine = PromptEngine::builtin();
/// let request = engine
///     .request(PromptId::SimpleResponse, &[("name", "Pip"), ("situation", "hi")])
///     .unwrap();
/// assert!(request.prompt.contains("Pip"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptEngine {
    templates: HashMap<PromptId, PromptTemplate>,
}

impl PromptEngine {
    /// Create a `PromptEngine` pre-loaded with the built-in constant templates.
    #[must_use]
    pub fn builtin() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            PromptId::CouncilResponse,
            PromptTemplate::builtin(100, 0.85, COUNCIL_RESPONSE_USER),
        );
        templates.insert(
            PromptId::SimpleResponse,
            PromptTemplate::builtin(150, 0.8, SIMPLE_RESPONSE_USER),
        );
        templates.insert(
            PromptId::MemorySummary,
            PromptTemplate::builtin(60, 0.7, MEMORY_SUMMARY_USER),
        );
        Self { templates }
    }

    /// Load prompt templates from a directory of TOML files.
    ///
    /// Each TOML file must match a known [`PromptId`] filename.
    /// Unknown files are ignored; missing ones keep their built-in template.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ConfigError`] if a TOML file exists but cannot be
    /// read or parsed, or if the directory holds no known template at all.
    pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self, LlmError> {
        let dir = dir.as_ref();
        let mut engine = Self::builtin();
        let mut loaded = 0usize;

        for id in PromptId::all() {
            let path: PathBuf = dir.join(id.filename());
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| {
                LlmError::ConfigError(format!("failed to read {}: {e}", path.display()))
            })?;
            let parsed: TomlPromptFile = toml::from_str(&content).map_err(|e| {
                LlmError::ConfigError(format!("failed to parse {}: {e}", path.display()))
            })?;

            let d = parsed.prompt;
            engine.templates.insert(
                *id,
                PromptTemplate {
                    version: d.version,
                    max_tokens: d.max_tokens,
                    temperature: d.temperature,
                    stop: d.stop,
                    system: d.system,
                    user: d.user,
                },
            );
            loaded += 1;
        }

        if loaded == 0 {
            return Err(LlmError::ConfigError(format!(
                "no prompt templates found in directory: {}",
                dir.display()
            )));
        }
        tracing::debug!(dir = %dir.display(), loaded, "Loaded prompt templates");
        Ok(engine)
    }

    /// Get a loaded prompt template by ID.
    #[must_use]
    pub fn get(&self, id: PromptId) -> Option<&PromptTemplate> {
        self.templates.get(&id)
    }

    /// Render both system and user prompts for a given ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt ID is not loaded.
    pub fn render(
        &self,
        id: PromptId,
        vars: &[(&str, &str)],
    ) -> Result<(String, String), LlmError> {
        let tpl = self.lookup(id)?;
        Ok((render_template(&tpl.system, vars), render_template(&tpl.user, vars)))
    }

    /// Render a ready-to-send request for a given ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt ID is not loaded.
    pub fn request(
        &self,
        id: PromptId,
        vars: &[(&str, &str)],
    ) -> Result<GenerationRequest, LlmError> {
        Ok(self.lookup(id)?.request(vars))
    }

    fn lookup(&self, id: PromptId) -> Result<&PromptTemplate, LlmError> {
        self.get(id)
            .ok_or_else(|| LlmError::ConfigError(format!("prompt template '{id}' not loaded")))
    }

    /// Number of loaded templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no templates are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// List all loaded prompt IDs.
    #[must_use]
    pub fn loaded_ids(&self) -> Vec<PromptId> {
        self.templates.keys().copied().collect()
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::builtin()
    }
}
