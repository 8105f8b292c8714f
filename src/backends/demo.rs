//! Offline demo backend.
//!
//! Answers with canned replies so the assistant can be tried without an API key.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::chat::{ChatMessage, ChatProvider, ChatResponse, ChatRole, Usage};
use crate::error::LLMError;
use crate::LLMProvider;

const DEMO_MODEL: &str = "demo";

const CANNED_REPLIES: &[&str] = &[
    "That's an interesting question! I'd be happy to help you with that.",
    "I understand what you're asking. Let me think about this...",
    "Great question! Here's what I think about that topic.",
    "That's a fascinating point. I can provide some insights on this.",
    "I see what you mean. Let me give you a detailed response.",
    "Excellent question! This is definitely worth exploring.",
    "I appreciate you asking about this. Here's my perspective.",
    "That's a really good question that many people wonder about.",
];

/// Provider that cycles through canned replies.
#[derive(Debug, Default)]
pub struct Demo {
    next: AtomicUsize,
    delay: Option<Duration>,
}

impl Demo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated thinking time before each reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug)]
struct DemoResponse {
    text: String,
    usage: Usage,
}

impl ChatResponse for DemoResponse {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn usage(&self) -> Option<Usage> {
        Some(self.usage.clone())
    }
}

impl std::fmt::Display for DemoResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[async_trait]
impl ChatProvider for Demo {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if !messages.iter().any(|m| m.role == ChatRole::User) {
            return Err(LLMError::InvalidRequest("no user message to answer".into()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let idx = self.next.fetch_add(1, Ordering::Relaxed) % CANNED_REPLIES.len();
        let text = format!(
            "{}\n\n(This is a demo response - connect a real API key for actual AI responses!)",
            CANNED_REPLIES[idx]
        );
        let prompt_tokens = messages.iter().map(|m| word_count(&m.content)).sum();
        let completion_tokens = word_count(&text);
        Ok(Box::new(DemoResponse {
            text,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        }))
    }

    fn model(&self) -> &str {
        DEMO_MODEL
    }
}

impl LLMProvider for Demo {}
