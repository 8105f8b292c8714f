//! Runtime settings.
//!
//! Defaults are overridable from the environment:
//!
//! | Variable | Setting |
//! |---|---|
//! | `ARIA_BACKEND` | provider backend (`openai` or `demo`) |
//! | `DEFAULT_MODEL` | model identifier |
//! | `MAX_TOKENS` | maximum tokens per reply |
//! | `TEMPERATURE` | sampling temperature |
//! | `TOP_P` | nucleus sampling |
//! | `ARIA_TIMEOUT_SECONDS` | request timeout |
//! | `ARIA_CEILING` | transcript ceiling, in turns |
//! | `ARIA_MEMORY_FILE` | memory JSON path |
//! | `ARIA_PERSONA_FILE` | persona JSON path |
//! | `PORT` | HTTP port |

use std::path::PathBuf;
use std::str::FromStr;

use crate::builder::{LLMBackend, LLMBuilder};
use crate::memory::transcript::DEFAULT_CEILING;
use crate::prompt::DEFAULT_RECALL_PER_CATEGORY;
use crate::providers::openai_compatible::DEFAULT_TIMEOUT_SECONDS;
use crate::secret_store::SecretStore;

/// Name of the environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Directory holding ARIA's files (`~/.aria`, or `.aria` without a home directory).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".aria"))
        .unwrap_or_else(|| PathBuf::from(".aria"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend: LLMBackend,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub timeout_seconds: u64,
    /// Transcript ceiling, in turns
    pub ceiling: usize,
    /// Recent facts per category rendered into the system prompt
    pub recall_per_category: usize,
    pub memory_file: PathBuf,
    pub persona_file: PathBuf,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        let dir = data_dir();
        Self {
            backend: LLMBackend::OpenAI,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1500,
            temperature: 0.9,
            top_p: 0.95,
            presence_penalty: 0.2,
            frequency_penalty: 0.1,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            ceiling: DEFAULT_CEILING,
            recall_per_category: DEFAULT_RECALL_PER_CATEGORY,
            memory_file: dir.join("memory.json"),
            persona_file: dir.join("persona.json"),
            port: 5000,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: Option<String>, current: T) -> T {
    match raw {
        Some(value) => match value.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("ignoring invalid {name}={value}");
                current
            }
        },
        None => current,
    }
}

impl Settings {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let ceiling = parse_var("ARIA_CEILING", lookup("ARIA_CEILING"), d.ceiling);
        Self {
            backend: parse_var("ARIA_BACKEND", lookup("ARIA_BACKEND"), d.backend),
            model: lookup("DEFAULT_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(d.model),
            max_tokens: parse_var("MAX_TOKENS", lookup("MAX_TOKENS"), d.max_tokens),
            temperature: parse_var("TEMPERATURE", lookup("TEMPERATURE"), d.temperature),
            top_p: parse_var("TOP_P", lookup("TOP_P"), d.top_p),
            presence_penalty: d.presence_penalty,
            frequency_penalty: d.frequency_penalty,
            timeout_seconds: parse_var(
                "ARIA_TIMEOUT_SECONDS",
                lookup("ARIA_TIMEOUT_SECONDS"),
                d.timeout_seconds,
            ),
            ceiling: if ceiling < 2 {
                log::warn!("ARIA_CEILING must be at least 2, using {}", d.ceiling);
                d.ceiling
            } else {
                ceiling
            },
            recall_per_category: d.recall_per_category,
            memory_file: lookup("ARIA_MEMORY_FILE")
                .map(PathBuf::from)
                .unwrap_or(d.memory_file),
            persona_file: lookup("ARIA_PERSONA_FILE")
                .map(PathBuf::from)
                .unwrap_or(d.persona_file),
            port: parse_var("PORT", lookup("PORT"), d.port),
        }
    }

    /// A provider builder carrying these sampling settings.
    pub fn provider_builder(&self) -> LLMBuilder {
        LLMBuilder::new()
            .backend(self.backend.clone())
            .model(&self.model)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .presence_penalty(self.presence_penalty)
            .frequency_penalty(self.frequency_penalty)
            .timeout_seconds(self.timeout_seconds)
    }
}

/// Resolves the API key: explicit value, then the secret store, then `OPENAI_API_KEY`.
pub fn resolve_api_key(explicit: Option<String>) -> Option<String> {
    explicit
        .filter(|k| !k.is_empty())
        .or_else(|| {
            SecretStore::new()
                .ok()
                .and_then(|store| store.get(API_KEY_ENV).cloned())
        })
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty())
}
