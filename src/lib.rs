//! ARIA is a personal assistant runtime built on chat-completion APIs.
//!
//! # Overview
//! A [`session::Session`] mediates one conversation: it renders a system prompt
//! from a persona and remembered facts, forwards the bounded transcript to a
//! completion provider, learns facts from what the user says, and folds old
//! turns into summary facts once the transcript grows past its ceiling.
//!
//! - Providers behind one trait (OpenAI-compatible HTTP, offline demo)
//! - Categorized, capped memory shared between sessions and persisted as JSON
//! - Typed errors with a stable kind for every failure
//!
//! # Architecture
//! The crate is organized into modules that handle different aspects of a session:
//!
//! - [`session`]: the submit / evict / clear / reset lifecycle
//! - [`memory`]: facts, the transcript window, extraction and persistence
//! - [`prompt`] and [`persona`]: who the assistant is and what it is told
//! - [`chat`], [`providers`] and [`backends`]: the completion providers
//! - [`config`] and [`secret_store`]: settings and stored API keys
//! - `api`: the optional HTTP host

// Re-export for convenience
pub use async_trait::async_trait;

/// Backend implementations for supported providers
pub mod backends;

/// Builder pattern for configuring and instantiating providers
pub mod builder;

/// Chat messages and the provider trait
pub mod chat;

/// Settings loaded from defaults and the environment
pub mod config;

/// Error types and handling
pub mod error;

/// Facts, transcript window, extraction and persistence
pub mod memory;

/// Assistant persona and owner profile
pub mod persona;

/// System prompt rendering
pub mod prompt;

/// Shared OpenAI-compatible wire implementation
pub mod providers;

/// Retry wrapper for providers
pub mod resilient_llm;

/// Secret store for API keys
pub mod secret_store;

/// Conversation sessions
pub mod session;

#[cfg(feature = "api")]
pub mod api;

/// Core trait that all providers must implement.
pub trait LLMProvider: chat::ChatProvider {}

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
