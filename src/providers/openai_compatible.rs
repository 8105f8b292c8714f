//! OpenAI-compatible API client base implementation
//!
//! This module provides a generic base for OpenAI-compatible chat-completion
//! APIs. Providers customize behavior by implementing [`OpenAICompatibleConfig`].

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, ChatProvider, ChatResponse, Usage};
use crate::error::LLMError;

/// Default request timeout when none is configured.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Generic OpenAI-compatible provider
///
/// Sampling parameters are fixed at construction time and sent with every request.
pub struct OpenAICompatibleProvider<T: OpenAICompatibleConfig> {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub timeout_seconds: u64,
    pub client: Client,
    _phantom: PhantomData<T>,
}

/// Configuration trait for OpenAI-compatible providers
pub trait OpenAICompatibleConfig: Send + Sync {
    /// The name of the provider (e.g., "OpenAI")
    const PROVIDER_NAME: &'static str;

    /// Default base URL for the provider
    const DEFAULT_BASE_URL: &'static str;

    /// Default model for the provider
    const DEFAULT_MODEL: &'static str;

    /// Chat completions endpoint path (usually "chat/completions")
    const CHAT_ENDPOINT: &'static str = "chat/completions";

    /// Custom headers to add to requests
    fn custom_headers() -> Option<Vec<(String, String)>> {
        None
    }
}

/// Generic OpenAI-compatible chat message
#[derive(Serialize, Debug)]
pub struct OpenAICompatibleChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Generic OpenAI-compatible chat request
#[derive(Serialize, Debug)]
pub struct OpenAICompatibleChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OpenAICompatibleChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
}

/// Generic OpenAI-compatible chat response
#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatResponse {
    pub choices: Vec<OpenAICompatibleChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatChoice {
    pub message: OpenAICompatibleChatMsg,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatMsg {
    pub role: String,
    pub content: Option<String>,
}

/// Error envelope returned by OpenAI-compatible APIs on non-2xx responses
#[derive(Deserialize, Debug)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl ChatResponse for OpenAICompatibleChatResponse {
    fn text(&self) -> Option<String> {
        self.choices.first().and_then(|c| c.message.content.clone())
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.clone()
    }
}

impl std::fmt::Display for OpenAICompatibleChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.choices.first().and_then(|c| c.message.content.as_deref()) {
            Some(content) => write!(f, "{content}"),
            None => write!(f, ""),
        }
    }
}

/// Maps a non-success HTTP response onto the error taxonomy.
///
/// The `code`/`type` fields of the error envelope win over the status code,
/// since providers reuse 429 and 400 for several distinct conditions.
pub fn classify_error_response(provider: &str, status: StatusCode, body: &str) -> LLMError {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|p| p.error.code.clone().or_else(|| p.error.error_type.clone()))
        .unwrap_or_default();
    let message = parsed
        .as_ref()
        .map(|p| p.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{provider} API returned error status: {status}"));

    match code.as_str() {
        "invalid_api_key" => return LLMError::InvalidCredential(message),
        "insufficient_quota" => return LLMError::QuotaExceeded(message),
        "model_not_found" => return LLMError::ModelUnavailable(message),
        _ => {}
    }

    match status {
        StatusCode::UNAUTHORIZED => LLMError::InvalidCredential(message),
        StatusCode::TOO_MANY_REQUESTS => LLMError::QuotaExceeded(message),
        StatusCode::NOT_FOUND => LLMError::ModelUnavailable(message),
        _ if parsed.is_none() => LLMError::ResponseFormatError {
            message,
            raw_response: body.to_string(),
        },
        _ => LLMError::ProviderError {
            status: Some(status.as_u16()),
            message,
        },
    }
}

impl<T: OpenAICompatibleConfig> OpenAICompatibleProvider<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
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
        let timeout_seconds = timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| LLMError::InvalidRequest(format!("Failed to build HTTP client: {e}")))?;

        let mut base = base_url.unwrap_or_else(|| T::DEFAULT_BASE_URL.to_owned());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| LLMError::InvalidRequest(format!("Invalid base URL '{base}': {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            model: model.unwrap_or_else(|| T::DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            top_p,
            presence_penalty,
            frequency_penalty,
            timeout_seconds,
            client,
            _phantom: PhantomData,
        })
    }
}

#[async_trait]
impl<T: OpenAICompatibleConfig> ChatProvider for OpenAICompatibleProvider<T> {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<Box<dyn ChatResponse>, LLMError> {
        if self.api_key.trim().is_empty() {
            return Err(LLMError::CredentialMissing(format!(
                "Missing {} API key",
                T::PROVIDER_NAME
            )));
        }

        let body = OpenAICompatibleChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| OpenAICompatibleChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            presence_penalty: self.presence_penalty,
            frequency_penalty: self.frequency_penalty,
        };

        let url = self
            .base_url
            .join(T::CHAT_ENDPOINT)
            .map_err(|e| LLMError::InvalidRequest(e.to_string()))?;

        let mut request = self.client.post(url).bearer_auth(&self.api_key).json(&body);

        if let Some(headers) = T::custom_headers() {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("{} request payload: {}", T::PROVIDER_NAME, json);
            }
        }

        let response = request.send().await?;
        let status = response.status();

        log::debug!("{} HTTP status: {}", T::PROVIDER_NAME, status);

        let resp_text = response.text().await?;
        if !status.is_success() {
            return Err(classify_error_response(T::PROVIDER_NAME, status, &resp_text));
        }

        let json_resp: OpenAICompatibleChatResponse =
            serde_json::from_str(&resp_text).map_err(|e| LLMError::ResponseFormatError {
                message: format!("Failed to decode {} API response: {e}", T::PROVIDER_NAME),
                raw_response: resp_text.clone(),
            })?;

        if json_resp.text().is_none() {
            return Err(LLMError::ResponseFormatError {
                message: format!("{} API response contained no text", T::PROVIDER_NAME),
                raw_response: resp_text,
            });
        }

        Ok(Box::new(json_resp))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
