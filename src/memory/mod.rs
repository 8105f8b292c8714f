//! Memory module for the facts a session learns about its owner.
//!
//! This module provides:
//! - [`MemoryStore`]: categorized facts, capped per category, plus a topic tally
//! - [`SharedMemory`]: the store shared between sessions with serialized writes
//! - [`Transcript`]: the bounded window of conversation turns
//! - [`FactExtractor`]: replaceable strategy turning user text into facts
//! - [`MemoryPersistence`]: load/save of the store (JSON file or in-process)

pub mod extract;
pub mod persistence;
pub mod shared_memory;
pub mod summary;
pub mod transcript;

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use extract::{FactExtractor, KeywordExtractor};
pub use persistence::{InMemoryStore, JsonFileStore, MemoryPersistence};
pub use shared_memory::SharedMemory;
pub use transcript::{Transcript, TranscriptLimits};

/// Maximum number of facts kept per category; older facts are dropped first.
pub const MAX_FACTS_PER_CATEGORY: usize = 50;

/// Number of characters of an input used as its topic key.
const TOPIC_KEY_CHARS: usize = 20;

/// Category a remembered fact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    /// Likes, dislikes and preferences
    Preference,
    /// Goals and aspirations
    Goal,
    /// Projects being worked on or completed
    Project,
    /// Digests of evicted conversation turns
    Summary,
}

impl MemoryCategory {
    /// All categories, in prompt order.
    pub const ALL: [MemoryCategory; 4] = [
        MemoryCategory::Preference,
        MemoryCategory::Goal,
        MemoryCategory::Project,
        MemoryCategory::Summary,
    ];

    /// Heading used when facts are shown to people or to the model.
    pub fn label(&self) -> &'static str {
        match self {
            MemoryCategory::Preference => "Preferences",
            MemoryCategory::Goal => "Goals",
            MemoryCategory::Project => "Projects",
            MemoryCategory::Summary => "Earlier conversations",
        }
    }
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryCategory::Preference => "preference",
            MemoryCategory::Goal => "goal",
            MemoryCategory::Project => "project",
            MemoryCategory::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// A single remembered fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFact {
    pub category: MemoryCategory,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl MemoryFact {
    /// Creates a fact stamped with the current time.
    pub fn new(category: MemoryCategory, content: impl Into<String>) -> Self {
        Self {
            category,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Overrides the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Categorized facts about the owner, independent of any single transcript.
///
/// Every category is always present (possibly empty) so the persisted
/// document has a fixed shape. Loaded documents are rebuilt fact by fact, so
/// each fact lands under its own category and the per-category cap holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredMemory")]
pub struct MemoryStore {
    facts: BTreeMap<MemoryCategory, VecDeque<MemoryFact>>,
    topics: BTreeMap<String, u32>,
}

/// Persisted shape of a [`MemoryStore`], before normalization.
#[derive(Deserialize)]
struct StoredMemory {
    #[serde(default)]
    facts: BTreeMap<MemoryCategory, Vec<MemoryFact>>,
    #[serde(default)]
    topics: BTreeMap<String, u32>,
}

impl From<StoredMemory> for MemoryStore {
    fn from(stored: StoredMemory) -> Self {
        let mut store = MemoryStore {
            topics: stored.topics,
            ..MemoryStore::default()
        };
        for (key, facts) in stored.facts {
            for fact in facts {
                if fact.category != key {
                    log::warn!(
                        "fact stored under '{key}' is labelled '{}', filing it by label",
                        fact.category
                    );
                }
                store.add(fact);
            }
        }
        store
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            facts: MemoryCategory::ALL
                .iter()
                .map(|c| (*c, VecDeque::new()))
                .collect(),
            topics: BTreeMap::new(),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fact to its category, dropping the oldest beyond the cap.
    pub fn add(&mut self, fact: MemoryFact) {
        let list = self.facts.entry(fact.category).or_default();
        list.push_back(fact);
        while list.len() > MAX_FACTS_PER_CATEGORY {
            list.pop_front();
        }
    }

    pub fn extend(&mut self, facts: impl IntoIterator<Item = MemoryFact>) {
        for fact in facts {
            self.add(fact);
        }
    }

    /// All facts of a category, oldest first.
    pub fn facts(&self, category: MemoryCategory) -> impl Iterator<Item = &MemoryFact> {
        self.facts.get(&category).into_iter().flatten()
    }

    /// The most recent `limit` facts of a category, oldest first.
    pub fn recent(&self, category: MemoryCategory, limit: usize) -> Vec<&MemoryFact> {
        match self.facts.get(&category) {
            Some(list) => list
                .iter()
                .skip(list.len().saturating_sub(limit))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn count(&self, category: MemoryCategory) -> usize {
        self.facts.get(&category).map_or(0, VecDeque::len)
    }

    /// Total number of facts across all categories.
    pub fn len(&self) -> usize {
        self.facts.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.topics.is_empty()
    }

    /// Counts one occurrence of the topic an input opens with.
    pub fn record_topic(&mut self, text: &str) {
        let key: String = text
            .trim()
            .to_lowercase()
            .chars()
            .take(TOPIC_KEY_CHARS)
            .collect();
        if key.is_empty() {
            return;
        }
        *self.topics.entry(key).or_insert(0) += 1;
    }

    /// The `limit` most frequent topics, ties broken alphabetically.
    pub fn top_topics(&self, limit: usize) -> Vec<(&str, u32)> {
        let mut topics: Vec<(&str, u32)> =
            self.topics.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        topics.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        topics.truncate(limit);
        topics
    }

    /// Forgets every fact and topic.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
