use std::fmt;

use serde::{Deserialize, Serialize};

/// Error types that can occur while running a session against a completion provider.
#[derive(Debug, Clone, PartialEq)]
pub enum LLMError {
    /// No API key was configured for the provider
    CredentialMissing(String),
    /// Network errors, timeouts and other transport problems
    TransportFailure(String),
    /// The account ran out of quota or hit its rate limit
    QuotaExceeded(String),
    /// The provider rejected the API key
    InvalidCredential(String),
    /// The requested model does not exist or is not accessible
    ModelUnavailable(String),
    /// Persisted memory could not be decoded
    MalformedPersistedState(String),
    /// Invalid request parameters or input
    InvalidRequest(String),
    /// Any other error reported by the provider
    ProviderError {
        /// HTTP status of the failed response, when there was one
        status: Option<u16>,
        message: String,
    },
    /// The provider answered with something that is not a usable completion
    ResponseFormatError {
        /// Description of what went wrong
        message: String,
        /// Raw body returned by the provider
        raw_response: String,
    },
}

/// Failure category of an [`LLMError`], stable across message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CredentialMissing,
    TransportFailure,
    QuotaExceeded,
    InvalidCredential,
    ModelUnavailable,
    MalformedPersistedState,
    InvalidRequest,
    ProviderError,
    ResponseFormat,
}

impl LLMError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LLMError::CredentialMissing(_) => ErrorKind::CredentialMissing,
            LLMError::TransportFailure(_) => ErrorKind::TransportFailure,
            LLMError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            LLMError::InvalidCredential(_) => ErrorKind::InvalidCredential,
            LLMError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            LLMError::MalformedPersistedState(_) => ErrorKind::MalformedPersistedState,
            LLMError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            LLMError::ProviderError { .. } => ErrorKind::ProviderError,
            LLMError::ResponseFormatError { .. } => ErrorKind::ResponseFormat,
        }
    }

    /// Suggested next step for the person at the keyboard.
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::CredentialMissing => {
                "Set OPENAI_API_KEY or store a key with `aria set OPENAI_API_KEY <key>`."
            }
            ErrorKind::TransportFailure => "Check your network connection and try again.",
            ErrorKind::QuotaExceeded => {
                "Check your usage and billing details; you may have used up your credits."
            }
            ErrorKind::InvalidCredential => "Check that your API key is correct or create a new one.",
            ErrorKind::ModelUnavailable => {
                "You might not have access to this model; try another one with --model."
            }
            ErrorKind::MalformedPersistedState => "The memory file was unreadable and has been ignored.",
            ErrorKind::InvalidRequest => "Check the input and settings you provided.",
            ErrorKind::ProviderError | ErrorKind::ResponseFormat => {
                "The provider had a problem answering; try again shortly."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::CredentialMissing => "credential_missing",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::InvalidCredential => "invalid_credential",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::MalformedPersistedState => "malformed_persisted_state",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::ResponseFormat => "response_format",
        };
        f.write_str(name)
    }
}

impl fmt::Display for LLMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMError::CredentialMissing(e) => write!(f, "Missing Credential: {e}"),
            LLMError::TransportFailure(e) => write!(f, "Transport Error: {e}"),
            LLMError::QuotaExceeded(e) => write!(f, "Quota Exceeded: {e}"),
            LLMError::InvalidCredential(e) => write!(f, "Invalid Credential: {e}"),
            LLMError::ModelUnavailable(e) => write!(f, "Model Unavailable: {e}"),
            LLMError::MalformedPersistedState(e) => write!(f, "Malformed Memory File: {e}"),
            LLMError::InvalidRequest(e) => write!(f, "Invalid Request: {e}"),
            LLMError::ProviderError {
                status: Some(status),
                message,
            } => write!(f, "Provider Error: {status}: {message}"),
            LLMError::ProviderError {
                status: None,
                message,
            } => write!(f, "Provider Error: {message}"),
            LLMError::ResponseFormatError {
                message,
                raw_response,
            } => write!(f, "Response Format Error: {message}. Raw response: {raw_response}"),
        }
    }
}

impl std::error::Error for LLMError {}

/// Converts reqwest HTTP errors into transport failures
impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LLMError::TransportFailure(format!("request timed out: {err}"))
        } else {
            LLMError::TransportFailure(err.to_string())
        }
    }
}
