//! Bounded conversation transcript.
//!
//! A FIFO window of user/assistant turns. Unlike a plain sliding window it
//! never drops turns on its own: the session decides when the ceiling is
//! exceeded and drains the oldest turns so they can be summarized first.

use std::collections::VecDeque;

use crate::chat::ChatMessage;

/// Default maximum transcript length, in turns.
pub const DEFAULT_CEILING: usize = 20;

/// Size limits of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptLimits {
    /// Maximum number of turns kept after a submit completes
    pub ceiling: usize,
    /// Number of most recent turns kept when the ceiling is exceeded
    pub retain: usize,
}

impl TranscriptLimits {
    /// Limits that halve the transcript: `retain = ceiling - ceiling / 2`.
    ///
    /// # Panics
    ///
    /// Panics if `ceiling` is less than 2
    pub fn new(ceiling: usize) -> Self {
        if ceiling < 2 {
            panic!("Transcript ceiling must be at least 2");
        }
        Self {
            ceiling,
            retain: ceiling - ceiling / 2,
        }
    }

    /// Overrides how many recent turns survive an eviction (clamped to the ceiling).
    pub fn with_retain(mut self, retain: usize) -> Self {
        self.retain = retain.min(self.ceiling);
        self
    }

    /// Number of turns summarized away when the ceiling is first exceeded.
    pub fn eviction_count(&self) -> usize {
        self.ceiling - self.retain
    }
}

impl Default for TranscriptLimits {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING)
    }
}

/// Ordered user/assistant turns of one session, excluding the system turn.
#[derive(Debug, Clone)]
pub struct Transcript {
    turns: VecDeque<ChatMessage>,
    limits: TranscriptLimits,
}

impl Transcript {
    pub fn new(limits: TranscriptLimits) -> Self {
        Self {
            turns: VecDeque::with_capacity(limits.ceiling + 2),
            limits,
        }
    }

    pub fn limits(&self) -> TranscriptLimits {
        self.limits
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.turns.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn exceeds_ceiling(&self) -> bool {
        self.turns.len() > self.limits.ceiling
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.turns.iter()
    }

    /// Get all stored turns in chronological order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().cloned().collect()
    }

    /// Get the most recent N turns.
    pub fn recent_messages(&self, limit: usize) -> Vec<ChatMessage> {
        let start = self.turns.len().saturating_sub(limit);
        self.turns.range(start..).cloned().collect()
    }

    /// Removes and returns the turns that fall outside the retained window.
    ///
    /// Returns an empty vector when the ceiling is not exceeded. Otherwise the
    /// transcript shrinks to exactly `retain` turns, so an exchange that pushes
    /// it past the ceiling drains more than [`TranscriptLimits::eviction_count`]
    /// turns (12 for the default 20-turn ceiling reached at 22 turns).
    pub fn drain_overflow(&mut self) -> Vec<ChatMessage> {
        if !self.exceeds_ceiling() {
            return Vec::new();
        }
        let count = self.turns.len() - self.limits.retain;
        self.turns.drain(..count).collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(limits: TranscriptLimits, turns: usize) -> Transcript {
        let mut t = Transcript::new(limits);
        for i in 0..turns {
            let msg = if i % 2 == 0 {
                ChatMessage::user().content(format!("u{i}")).build()
            } else {
                ChatMessage::assistant().content(format!("a{i}")).build()
            };
            t.push(msg);
        }
        t
    }

    #[test]
    fn default_limits_halve() {
        let limits = TranscriptLimits::default();
        assert_eq!(limits.ceiling, 20);
        assert_eq!(limits.retain, 10);
        assert_eq!(limits.eviction_count(), 10);
    }

    #[test]
    #[should_panic]
    fn tiny_ceiling_panics() {
        let _ = TranscriptLimits::new(1);
    }

    #[test]
    fn no_overflow_within_ceiling() {
        let mut t = filled(TranscriptLimits::new(4), 4);
        assert!(t.drain_overflow().is_empty());
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn overflow_drains_oldest_in_order() {
        let mut t = filled(TranscriptLimits::new(4), 6);
        let before = t.messages();
        let evicted = t.drain_overflow();
        assert_eq!(evicted, before[..4].to_vec());
        assert_eq!(t.messages(), before[4..].to_vec());
    }

    #[test]
    fn crossing_default_ceiling_drains_down_to_retain() {
        let mut t = filled(TranscriptLimits::default(), 22);
        let evicted = t.drain_overflow();
        assert_eq!(evicted.len(), 12);
        assert!(evicted.len() > t.limits().eviction_count());
        assert_eq!(t.len(), 10);
        assert_eq!(t.messages()[0].content, "u12");
    }

    #[test]
    fn retain_is_clamped_to_ceiling() {
        let limits = TranscriptLimits::new(6).with_retain(100);
        assert_eq!(limits.retain, 6);
        let mut t = filled(limits, 8);
        assert_eq!(t.drain_overflow().len(), 2);
        assert_eq!(t.len(), 6);
    }
}
