//! OpenAI API client implementation using the OpenAI-compatible base
//!
//! This module provides integration with OpenAI's GPT models through their API.

use crate::error::LLMError;
use crate::providers::openai_compatible::{OpenAICompatibleConfig, OpenAICompatibleProvider};
use crate::LLMProvider;

/// OpenAI configuration for the generic provider
pub struct OpenAIConfig;

impl OpenAICompatibleConfig for OpenAIConfig {
    const PROVIDER_NAME: &'static str = "OpenAI";
    const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1/";
    const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
}

/// Type alias for OpenAI client using the generic provider
pub type OpenAI = OpenAICompatibleProvider<OpenAIConfig>;

impl OpenAI {
    /// Creates a new OpenAI client with the specified configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        top_p: Option<f32>,
        presence_penalty: Option<f32>,
        frequency_penalty: Option<f32>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        <OpenAICompatibleProvider<OpenAIConfig>>::new(
            api_key,
            base_url,
            model,
            max_tokens,
            temperature,
            top_p,
            presence_penalty,
            frequency_penalty,
            timeout_seconds,
        )
    }
}

impl LLMProvider for OpenAI {}

#[cfg(test)]
const LLM_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[tokio::test]
async fn test_openai_chat_live() -> Result<(), Box<dyn std::error::Error>> {
    use crate::chat::{ChatMessage, ChatProvider};

    let api_key = match std::env::var(LLM_API_KEY_ENV) {
        Ok(key) => key,
        Err(_) => {
            eprintln!("test test_openai_chat_live ... ignored, {LLM_API_KEY_ENV} not set");
            return Ok(());
        }
    };
    let llm = OpenAI::with_config(
        api_key,
        None,
        Some("gpt-4o-mini".into()),
        Some(64),
        Some(0.7),
        None,
        None,
        None,
        Some(30),
    )?;
    let messages = vec![ChatMessage::user().content("Hello.").build()];
    let response = llm.chat(&messages).await?;
    assert!(
        response.text().is_some_and(|t| !t.is_empty()),
        "Expected response message, got {:?}",
        response.text()
    );
    Ok(())
}
