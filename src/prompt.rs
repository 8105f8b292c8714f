//! System prompt rendering.

use std::fmt::Write;

use crate::memory::{MemoryCategory, MemoryStore};
use crate::persona::PersonaConfig;

/// Default number of recent facts per category included in the prompt.
pub const DEFAULT_RECALL_PER_CATEGORY: usize = 3;

/// Number of frequent topics mentioned in the prompt.
const TOP_TOPICS: usize = 5;

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none yet".to_string()
    } else {
        items.join(", ")
    }
}

/// Renders the system turn for a session.
///
/// Pure: the output depends only on the persona, the owner profile and the
/// most recent `recall_per_category` facts of each category in `memory`.
///
/// # Arguments
///
/// * `config` - Persona and owner profile
/// * `memory` - Facts learned so far
/// * `recall_per_category` - How many recent facts of each category to include
pub fn render_system_prompt(
    config: &PersonaConfig,
    memory: &MemoryStore,
    recall_per_category: usize,
) -> String {
    let persona = &config.persona;
    let owner = &config.owner;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "You are {}, the personal AI assistant of {}.",
        persona.name, owner.name
    );
    out.push('\n');
    out.push_str("IDENTITY\n");
    let _ = writeln!(out, "- Traits: {}", list_or_none(&persona.traits));
    let _ = writeln!(out, "- Communication style: {}", persona.communication_style);
    let _ = writeln!(out, "- Expertise: {}", list_or_none(&persona.expertise));
    out.push('\n');

    let _ = writeln!(out, "ABOUT {}", owner.name.to_uppercase());
    let _ = writeln!(out, "- Interests: {}", list_or_none(&owner.interests));
    let _ = writeln!(out, "- Goals: {}", list_or_none(&owner.goals));
    let _ = writeln!(
        out,
        "- Current projects: {}",
        list_or_none(&owner.current_projects)
    );
    out.push('\n');

    out.push_str("MEMORY\n");
    let mut remembered = false;
    for category in MemoryCategory::ALL {
        let facts = memory.recent(category, recall_per_category);
        if facts.is_empty() {
            continue;
        }
        remembered = true;
        let _ = writeln!(out, "{}:", category.label());
        for fact in facts {
            let _ = writeln!(out, "- {}", fact.content);
        }
    }
    let topics = memory.top_topics(TOP_TOPICS);
    if !topics.is_empty() {
        remembered = true;
        let names: Vec<&str> = topics.iter().map(|(t, _)| *t).collect();
        let _ = writeln!(out, "Frequent topics: {}", names.join("; "));
    }
    if !remembered {
        out.push_str("Nothing remembered yet.\n");
    }
    out.push('\n');

    out.push_str("GUIDELINES\n");
    let _ = writeln!(out, "- Address {} by name when it feels natural.", owner.name);
    out.push_str("- Build on what you remember instead of asking again.\n");
    out.push_str("- Suggest concrete next steps for ongoing goals and projects.\n");
    out.push_str("- Keep answers focused and honest about uncertainty.");
    out
}
