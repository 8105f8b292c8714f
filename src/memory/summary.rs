//! Digest of evicted conversation turns.

use std::sync::OnceLock;

use regex::Regex;

use crate::chat::{ChatMessage, ChatRole};

/// Maximum number of salient words listed in a digest.
pub const MAX_SALIENT_WORDS: usize = 5;

/// Shortest word, in characters, that counts as salient.
const MIN_SALIENT_CHARS: usize = 6;

fn word_pattern() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"[\w'-]+").expect("word pattern is valid"))
}

/// Distinct lowercase words longer than five characters from user turns,
/// in first-seen order, at most [`MAX_SALIENT_WORDS`].
pub fn salient_words(turns: &[ChatMessage]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for turn in turns.iter().filter(|t| t.role == ChatRole::User) {
        let lowered = turn.content.to_lowercase();
        for m in word_pattern().find_iter(&lowered) {
            let word = m.as_str().trim_matches(|c| c == '\'' || c == '-');
            if word.chars().count() < MIN_SALIENT_CHARS || words.iter().any(|w| w == word) {
                continue;
            }
            words.push(word.to_string());
            if words.len() == MAX_SALIENT_WORDS {
                return words;
            }
        }
    }
    words
}

/// Builds the summary text for a batch of evicted turns.
///
/// `"Discussed 5 exchanges including: parser, lifetimes"`. The exchange count
/// is the number of user turns in the batch.
pub fn digest(turns: &[ChatMessage]) -> String {
    let exchanges = turns.iter().filter(|t| t.role == ChatRole::User).count();
    let noun = if exchanges == 1 { "exchange" } else { "exchanges" };
    let words = salient_words(turns);
    if words.is_empty() {
        format!("Discussed {exchanges} {noun}")
    } else {
        format!("Discussed {exchanges} {noun} including: {}", words.join(", "))
    }
}
