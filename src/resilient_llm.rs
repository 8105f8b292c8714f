//! Resilience wrapper providing retry with exponential backoff for providers.
//!
//! This wrapper retries transient failures with exponential backoff and jitter.
//! Only transport failures and 5xx provider errors are retried; a bad key,
//! an exhausted quota or a rejected request fails on the first attempt.
//!
//! # Example
//!
//! ```no_run
//! use aria::builder::{LLMBackend, LLMBuilder};
//! use aria::chat::ChatProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let llm = LLMBuilder::new()
//!         .backend(LLMBackend::OpenAI)
//!         .api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
//!         .model("gpt-4o-mini")
//!         .resilient(true)
//!         .resilient_attempts(3)
//!         .resilient_backoff(200, 2_000)
//!         .build()?;
//!
//!     let msgs = [aria::chat::ChatMessage::user().content("Say hi succinctly").build()];
//!     let resp = llm.chat(&msgs).await?;
//!     println!("{}", resp);
//!     Ok(())
//! }
//! ```
use std::time::Duration;

use async_trait::async_trait;
// Deterministic jitter only; no RNG
use tokio::time::sleep;

use crate::chat::{ChatMessage, ChatProvider, ChatResponse};
use crate::error::LLMError;
use crate::LLMProvider;

/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug)]
pub struct ResilienceConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Whether to shave a deterministic jitter off each delay
    pub jitter: bool,
}

impl ResilienceConfig {
    /// Creates a default configuration with sane values.
    pub fn defaults() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            jitter: true,
        }
    }
}

/// Resilient wrapper that retries transient failures using exponential backoff.
pub struct ResilientLLM {
    inner: Box<dyn LLMProvider>,
    cfg: ResilienceConfig,
}

impl ResilientLLM {
    /// Creates a new resilient wrapper around an existing provider.
    pub fn new(inner: Box<dyn LLMProvider>, cfg: ResilienceConfig) -> Self {
        Self { inner, cfg }
    }

    pub(crate) fn is_retryable(err: &LLMError) -> bool {
        match err {
            LLMError::TransportFailure(_) => true,
            LLMError::ProviderError { status, .. } => !matches!(status, Some(s) if *s < 500),
            LLMError::ResponseFormatError { .. } => false,
            LLMError::CredentialMissing(_) => false,
            LLMError::InvalidCredential(_) => false,
            LLMError::QuotaExceeded(_) => false,
            LLMError::ModelUnavailable(_) => false,
            LLMError::MalformedPersistedState(_) => false,
            LLMError::InvalidRequest(_) => false,
        }
    }

    pub(crate) fn backoff_delay(&self, attempt_index: usize) -> Duration {
        let mut delay = self
            .cfg
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16));
        delay = delay.min(self.cfg.max_delay_ms);
        if self.cfg.jitter {
            let span = (delay / 2).max(1);
            let jitter = ((attempt_index as u64)
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1))
                % span;
            delay = delay.saturating_sub(jitter);
        }
        Duration::from_millis(delay)
    }
}

impl LLMProvider for ResilientLLM {}

#[async_trait]
impl ChatProvider for ResilientLLM {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        let mut idx = 0usize;
        loop {
            match self.inner.chat(messages).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if idx + 1 >= self.cfg.max_attempts || !Self::is_retryable(&e) {
                        return Err(e);
                    }
                    log::debug!("retrying after transient failure (attempt {}): {e}", idx + 1);
                    sleep(self.backoff_delay(idx)).await;
                    idx += 1;
                }
            }
        }
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Flaky {
        calls: Arc<AtomicUsize>,
        failures: usize,
        error: LLMError,
    }

    #[derive(Debug)]
    struct Text(String);

    impl ChatResponse for Text {
        fn text(&self) -> Option<String> {
            Some(self.0.clone())
        }
    }

    impl std::fmt::Display for Text {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[async_trait]
    impl ChatProvider for Flaky {
        async fn chat(&self, _: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(Box::new(Text("ok".into())))
            }
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    impl LLMProvider for Flaky {}

    fn wrapper(failures: usize, error: LLMError) -> (ResilientLLM, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = Flaky {
            calls: calls.clone(),
            failures,
            error,
        };
        let cfg = ResilienceConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter: false,
        };
        (ResilientLLM::new(Box::new(inner), cfg), calls)
    }

    #[tokio::test]
    async fn retries_transport_failures() {
        let (llm, calls) = wrapper(2, LLMError::TransportFailure("reset".into()));
        let resp = llm.chat(&[]).await.unwrap();
        assert_eq!(resp.text().as_deref(), Some("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let (llm, calls) = wrapper(5, LLMError::TransportFailure("reset".into()));
        let err = llm.chat(&[]).await.unwrap_err();
        assert!(matches!(err, LLMError::TransportFailure(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn quota_errors_are_not_retried() {
        let (llm, calls) = wrapper(1, LLMError::QuotaExceeded("no credits".into()));
        let err = llm.chat(&[]).await.unwrap_err();
        assert!(matches!(err, LLMError::QuotaExceeded(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let error = LLMError::ProviderError {
            status: Some(502),
            message: "bad gateway".into(),
        };
        let (llm, calls) = wrapper(1, error);
        assert!(llm.chat(&[]).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let error = LLMError::ProviderError {
            status: Some(400),
            message: "Invalid value for 'temperature'".into(),
        };
        let (llm, calls) = wrapper(3, error);
        let err = llm.chat(&[]).await.unwrap_err();
        assert!(matches!(err, LLMError::ProviderError { status: Some(400), .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_capped() {
        let (llm, _) = wrapper(0, LLMError::TransportFailure(String::new()));
        assert_eq!(llm.backoff_delay(0), Duration::from_millis(1));
        assert_eq!(llm.backoff_delay(10), Duration::from_millis(2));
    }
}
