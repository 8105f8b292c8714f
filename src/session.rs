//! Conversation sessions.
//!
//! A [`Session`] owns one bounded [`Transcript`] and a handle to the
//! [`SharedMemory`] of its owner. Each [`Session::submit`] is one round trip
//! to the provider; `&mut self` keeps a session to one request in flight.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aria::backends::demo::Demo;
//! use aria::memory::SharedMemory;
//! use aria::persona::PersonaConfig;
//! use aria::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), aria::error::LLMError> {
//!     let mut session = Session::new(
//!         Arc::new(Demo::new()),
//!         Arc::new(PersonaConfig::default()),
//!         SharedMemory::default(),
//!     );
//!     let reply = session.submit("I love hiking on weekends").await?;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::chat::{ChatMessage, Usage};
use crate::error::LLMError;
use crate::memory::summary::digest;
use crate::memory::{
    FactExtractor, KeywordExtractor, MemoryCategory, MemoryFact, MemoryPersistence, SharedMemory,
    Transcript, TranscriptLimits,
};
use crate::persona::PersonaConfig;
use crate::prompt::{render_system_prompt, DEFAULT_RECALL_PER_CATEGORY};
use crate::LLMProvider;

/// Outcome of a successful [`Session::submit`].
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    /// Assistant text, as recorded in the transcript
    pub text: String,
    /// Model that produced the reply
    pub model: String,
    pub usage: Option<Usage>,
    /// Facts extracted from the user's message
    pub learned: Vec<MemoryFact>,
    /// Summary fact written if this exchange pushed the transcript past its ceiling
    pub summary: Option<MemoryFact>,
}

/// One user's conversation with the assistant.
pub struct Session {
    provider: Arc<dyn LLMProvider>,
    persona: Arc<PersonaConfig>,
    memory: SharedMemory,
    transcript: Transcript,
    extractor: Arc<dyn FactExtractor>,
    persistence: Option<Arc<dyn MemoryPersistence>>,
    recall_per_category: usize,
}

impl Session {
    /// Creates a session with the default transcript limits, recall and extractor.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        persona: Arc<PersonaConfig>,
        memory: SharedMemory,
    ) -> Self {
        Self {
            provider,
            persona,
            memory,
            transcript: Transcript::new(TranscriptLimits::default()),
            extractor: Arc::new(KeywordExtractor::default()),
            persistence: None,
            recall_per_category: DEFAULT_RECALL_PER_CATEGORY,
        }
    }

    /// Replaces the transcript limits. Existing turns are discarded.
    pub fn with_limits(mut self, limits: TranscriptLimits) -> Self {
        self.transcript = Transcript::new(limits);
        self
    }

    pub fn with_recall_per_category(mut self, recall: usize) -> Self {
        self.recall_per_category = recall;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FactExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Saves memory through `persistence` after every change.
    pub fn with_persistence(mut self, persistence: Arc<dyn MemoryPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Switches the provider for later exchanges; transcript and memory carry over.
    pub fn set_provider(&mut self, provider: Arc<dyn LLMProvider>) {
        log::info!("switching model {} -> {}", self.provider.model(), provider.model());
        self.provider = provider;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Sends one user message and records the exchange.
    ///
    /// On failure nothing is recorded, so the same input can be retried.
    ///
    /// # Arguments
    ///
    /// * `text` - The user's message; must not be blank
    ///
    /// # Returns
    ///
    /// * `Result<Reply, LLMError>` - The assistant reply, or the classified failure
    pub async fn submit(&mut self, text: &str) -> Result<Reply, LLMError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LLMError::InvalidRequest(
                "Message must not be empty".to_string(),
            ));
        }

        let system = self.render_system_prompt().await;
        let user_turn = ChatMessage::user().content(text).build();
        let mut messages = Vec::with_capacity(self.transcript.len() + 2);
        messages.push(ChatMessage::system().content(system).build());
        messages.extend(self.transcript.iter().cloned());
        messages.push(user_turn.clone());

        log::debug!(
            "submitting {} turns to {}",
            messages.len(),
            self.provider.model()
        );
        let response = match self.provider.chat(&messages).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("exchange failed ({}): {e}", e.kind());
                return Err(e);
            }
        };
        let reply_text = response
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LLMError::ResponseFormatError {
                message: "Provider returned no text".to_string(),
                raw_response: response.to_string(),
            })?;

        self.transcript.push(user_turn);
        self.transcript
            .push(ChatMessage::assistant().content(reply_text.clone()).build());

        let learned = self.extract_facts(text);
        {
            let mut store = self.memory.write().await;
            store.extend(learned.iter().cloned());
            store.record_topic(text);
        }
        let summary = self.summarize_and_evict().await;
        self.persist().await;

        Ok(Reply {
            text: reply_text,
            model: self.provider.model().to_string(),
            usage: response.usage(),
            learned,
            summary,
        })
    }

    /// Facts the configured extractor finds in `text`.
    pub fn extract_facts(&self, text: &str) -> Vec<MemoryFact> {
        self.extractor.extract(text)
    }

    /// Folds the turns outside the retained window into one summary fact.
    ///
    /// Does nothing and returns `None` while the transcript is within its ceiling.
    pub async fn summarize_and_evict(&mut self) -> Option<MemoryFact> {
        let evicted = self.transcript.drain_overflow();
        if evicted.is_empty() {
            return None;
        }
        let fact = MemoryFact::new(MemoryCategory::Summary, digest(&evicted));
        log::debug!(
            "evicted {} turns, {} remain: {}",
            evicted.len(),
            self.transcript.len(),
            fact.content
        );
        self.memory.write().await.add(fact.clone());
        Some(fact)
    }

    /// The system turn for the current persona and memory.
    pub async fn render_system_prompt(&self) -> String {
        let store = self.memory.read().await;
        render_system_prompt(&self.persona, &store, self.recall_per_category)
    }

    /// Empties the transcript; memory is kept.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Empties the transcript and forgets everything in memory.
    pub async fn reset(&mut self) {
        self.transcript.clear();
        self.memory.clear().await;
        self.persist().await;
    }

    async fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let snapshot = self.memory.snapshot().await;
        if let Err(e) = persistence.save(&snapshot).await {
            log::warn!("failed to save memory: {e}");
        }
    }
}

/// Creates sessions that share one provider, persona and memory.
///
/// Used by hosts that serve several conversations at once.
#[derive(Clone)]
pub struct SessionFactory {
    provider: Arc<dyn LLMProvider>,
    persona: Arc<PersonaConfig>,
    memory: SharedMemory,
    extractor: Arc<dyn FactExtractor>,
    persistence: Option<Arc<dyn MemoryPersistence>>,
    limits: TranscriptLimits,
    recall_per_category: usize,
}

impl SessionFactory {
    pub fn new(provider: Arc<dyn LLMProvider>, persona: PersonaConfig, memory: SharedMemory) -> Self {
        Self {
            provider,
            persona: Arc::new(persona),
            memory,
            extractor: Arc::new(KeywordExtractor::default()),
            persistence: None,
            limits: TranscriptLimits::default(),
            recall_per_category: DEFAULT_RECALL_PER_CATEGORY,
        }
    }

    pub fn with_limits(mut self, limits: TranscriptLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_recall_per_category(mut self, recall: usize) -> Self {
        self.recall_per_category = recall;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FactExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn MemoryPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn persistence(&self) -> Option<&Arc<dyn MemoryPersistence>> {
        self.persistence.as_ref()
    }

    /// A fresh session with an empty transcript.
    pub fn create(&self) -> Session {
        let session = Session::new(
            self.provider.clone(),
            self.persona.clone(),
            self.memory.clone(),
        )
        .with_limits(self.limits)
        .with_recall_per_category(self.recall_per_category)
        .with_extractor(self.extractor.clone());
        match &self.persistence {
            Some(p) => session.with_persistence(p.clone()),
            None => session,
        }
    }
}
