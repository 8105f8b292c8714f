//! Builder module for configuring and instantiating completion providers.
//!
//! This module provides a builder pattern for creating provider instances with
//! fixed sampling settings and optional retry behavior.

use crate::{error::LLMError, LLMProvider};

/// Supported completion backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMBackend {
    /// OpenAI API provider (GPT-4o, GPT-4, etc.)
    OpenAI,
    /// Offline canned replies, no API key required
    Demo,
}

/// Implements string parsing for LLMBackend enum.
///
/// The parsing is case-insensitive.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use aria::builder::LLMBackend;
///
/// let backend = LLMBackend::from_str("OpenAI").unwrap();
/// assert_eq!(backend, LLMBackend::OpenAI);
///
/// let err = LLMBackend::from_str("invalid").unwrap_err();
/// assert!(err.to_string().contains("Unknown LLM backend"));
/// ```
impl std::str::FromStr for LLMBackend {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMBackend::OpenAI),
            "demo" => Ok(LLMBackend::Demo),
            _ => Err(LLMError::InvalidRequest(format!(
                "Unknown LLM backend: {}",
                s
            ))),
        }
    }
}

/// Builder for configuring and instantiating completion providers.
#[derive(Default)]
pub struct LLMBuilder {
    /// Selected backend provider
    backend: Option<LLMBackend>,
    /// API key for authentication with the provider
    api_key: Option<String>,
    /// Base URL for API requests (proxies, compatible servers, tests)
    base_url: Option<String>,
    /// Model identifier/name to use
    model: Option<String>,
    /// Maximum tokens to generate in responses
    max_tokens: Option<u32>,
    /// Temperature parameter for controlling response randomness
    temperature: Option<f32>,
    /// Top-p (nucleus) sampling parameter
    top_p: Option<f32>,
    /// Penalty for tokens already present in the text
    presence_penalty: Option<f32>,
    /// Penalty proportional to token frequency
    frequency_penalty: Option<f32>,
    /// Request timeout duration in seconds
    timeout_seconds: Option<u64>,
    /// Wrap the provider with retry on transient failures
    resilient: bool,
    resilient_attempts: Option<usize>,
    resilient_backoff: Option<(u64, u64)>,
}

impl LLMBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend provider to use.
    pub fn backend(mut self, backend: LLMBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature for controlling response randomness.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the top-p (nucleus) sampling parameter.
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets the presence penalty.
    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Sets the frequency penalty.
    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Enables retries with exponential backoff on transient failures.
    pub fn resilient(mut self, enable: bool) -> Self {
        self.resilient = enable;
        self
    }

    /// Sets the total number of attempts, including the first one.
    pub fn resilient_attempts(mut self, attempts: usize) -> Self {
        self.resilient_attempts = Some(attempts);
        self
    }

    /// Sets the base and maximum backoff delays in milliseconds.
    pub fn resilient_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.resilient_backoff = Some((base_delay_ms, max_delay_ms));
        self
    }

    /// Builds and returns a configured provider instance.
    ///
    /// A missing API key is not an error here: the provider reports
    /// `CredentialMissing` on first use so callers handle it like any other
    /// failed exchange.
    pub fn build(self) -> Result<Box<dyn LLMProvider>, LLMError> {
        let backend = self
            .backend
            .ok_or_else(|| LLMError::InvalidRequest("No backend specified".to_string()))?;

        let provider: Box<dyn LLMProvider> = match backend {
            LLMBackend::OpenAI => {
                #[cfg(not(feature = "openai"))]
                return Err(LLMError::InvalidRequest(
                    "OpenAI feature not enabled".to_string(),
                ));

                #[cfg(feature = "openai")]
                {
                    let openai = crate::backends::openai::OpenAI::with_config(
                        self.api_key.unwrap_or_default(),
                        self.base_url,
                        self.model,
                        self.max_tokens,
                        self.temperature,
                        self.top_p,
                        self.presence_penalty,
                        self.frequency_penalty,
                        self.timeout_seconds,
                    )?;
                    Box::new(openai)
                }
            }
            LLMBackend::Demo => Box::new(crate::backends::demo::Demo::new()),
        };

        #[allow(unreachable_code)]
        if self.resilient {
            let mut cfg = crate::resilient_llm::ResilienceConfig::defaults();
            if let Some(attempts) = self.resilient_attempts {
                cfg.max_attempts = attempts.max(1);
            }
            if let Some((base, max)) = self.resilient_backoff {
                cfg.base_delay_ms = base;
                cfg.max_delay_ms = max;
            }
            Ok(Box::new(crate::resilient_llm::ResilientLLM::new(provider, cfg)))
        } else {
            Ok(provider)
        }
    }
}
