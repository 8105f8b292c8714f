//! Fact extraction from user input.

use super::{MemoryCategory, MemoryFact};

/// Turns a user message into facts worth remembering.
///
/// Implementations must be deterministic: identical input yields facts with
/// identical categories and contents.
pub trait FactExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<MemoryFact>;
}

/// Default trigger phrases, in the order facts are emitted.
const TRIGGERS: &[(MemoryCategory, &[&str])] = &[
    (
        MemoryCategory::Preference,
        &["i prefer", "i like", "i love", "i hate", "i don't like"],
    ),
    (
        MemoryCategory::Goal,
        &["i want to", "my goal", "i plan to", "i hope to", "i'm trying to"],
    ),
    (
        MemoryCategory::Project,
        &[
            "working on",
            "building",
            "creating",
            "developing",
            "finished",
            "completed",
        ],
    ),
];

/// Keyword heuristic: one fact per trigger phrase found in the text.
///
/// Matching is ASCII case-insensitive. The fact content is the original text
/// from the first occurrence of the phrase onward, trimmed.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    rules: Vec<(MemoryCategory, Vec<String>)>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self {
            rules: TRIGGERS
                .iter()
                .map(|(cat, phrases)| (*cat, phrases.iter().map(|p| p.to_string()).collect()))
                .collect(),
        }
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trigger phrase for a category.
    pub fn with_trigger(mut self, category: MemoryCategory, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into().to_lowercase();
        match self.rules.iter_mut().find(|(c, _)| *c == category) {
            Some((_, phrases)) => phrases.push(phrase),
            None => self.rules.push((category, vec![phrase])),
        }
        self
    }
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.char_indices().map(|(i, _)| i).find(|&i| {
        haystack
            .get(i..i + needle.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(needle))
    })
}

impl FactExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> Vec<MemoryFact> {
        let mut facts = Vec::new();
        for (category, phrases) in &self.rules {
            for phrase in phrases {
                if let Some(start) = find_ignore_case(text, phrase) {
                    let content = text[start..].trim();
                    log::trace!("matched '{phrase}' as {category}");
                    facts.push(MemoryFact::new(*category, content));
                }
            }
        }
        facts
    }
}
