//! Persona and owner profile used to render the system prompt.
//!
//! Loaded from a JSON file shaped like:
//!
//! ```json
//! {
//!   "persona": { "name": "ARIA", "traits": ["curious"], "communication_style": "warm", "expertise": ["Rust"] },
//!   "owner": { "name": "Sam", "interests": [], "goals": [], "current_projects": [] }
//! }
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LLMError;

/// Who the assistant is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub name: String,
    pub traits: Vec<String>,
    pub communication_style: String,
    pub expertise: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "ARIA".to_string(),
            traits: vec![
                "curious".to_string(),
                "supportive".to_string(),
                "direct".to_string(),
            ],
            communication_style: "friendly and encouraging, with concrete suggestions".to_string(),
            expertise: vec![
                "programming".to_string(),
                "AI development".to_string(),
                "learning plans".to_string(),
            ],
        }
    }
}

/// Who the assistant works for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerProfile {
    pub name: String,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub current_projects: Vec<String>,
}

impl Default for OwnerProfile {
    fn default() -> Self {
        Self {
            name: "Friend".to_string(),
            interests: Vec::new(),
            goals: Vec::new(),
            current_projects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub persona: Persona,
    pub owner: OwnerProfile,
}

impl PersonaConfig {
    pub fn from_json(json: &str) -> Result<Self, LLMError> {
        serde_json::from_str(json).map_err(|e| LLMError::MalformedPersistedState(e.to_string()))
    }

    /// Loads a persona file, using defaults when it is missing or malformed.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("cannot read persona file {}: {e}", path.display());
                }
                return Self::default();
            }
        };
        match Self::from_json(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("persona file {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }
}
