use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::types::{
    Ack, ChatReply, ChatRequest, ConversationRequest, ErrorBody, MemorySummary, ModelInfo,
    ModelsResponse, StatusResponse,
};
use super::ServerState;
use crate::error::{ErrorKind, LLMError};
use crate::memory::MemoryCategory;

/// Models offered to API clients, as (id, display name).
const KNOWN_MODELS: &[(&str, &str)] = &[
    ("gpt-4o-mini", "GPT-4o Mini (Recommended)"),
    ("gpt-4o", "GPT-4o"),
    ("gpt-4-turbo", "GPT-4 Turbo"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
];

/// Error returned by every handler: a status code with a JSON body
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                error: message.into(),
                kind: None,
                hint: None,
            },
        }
    }
}

/// HTTP status for a failed exchange
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::TransportFailure => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::CredentialMissing | ErrorKind::InvalidCredential => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::ModelUnavailable
        | ErrorKind::ProviderError
        | ErrorKind::ResponseFormat
        | ErrorKind::MalformedPersistedState => StatusCode::BAD_GATEWAY,
    }
}

impl From<LLMError> for ApiError {
    fn from(err: LLMError) -> Self {
        let kind = err.kind();
        Self {
            status: status_for(kind),
            body: ErrorBody {
                success: false,
                error: err.to_string(),
                kind: Some(kind),
                hint: Some(err.hint().to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Validates the Bearer token when the server has an auth key configured
fn authorize(state: &ServerState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(key) = &state.auth_key else {
        return Ok(());
    };
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Missing authorization"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid authorization header"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token == key => Ok(()),
        _ => Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key")),
    }
}

/// Handles one chat message
///
/// # Arguments
/// * `state` - Server state with the session registry and auth configuration
/// * `headers` - HTTP request headers for authentication
/// * `req` - The message and optional conversation id
///
/// # Returns
/// * `Ok(Json<ChatReply>)` - Assistant reply and the conversation id to continue with
/// * `Err(ApiError)` - 400 for a missing message, otherwise the classified provider failure
pub async fn handle_chat(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    authorize(&state, &headers)?;

    let message = req
        .message
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Message is required"))?;
    if message.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Message cannot be empty",
        ));
    }

    let (conversation_id, session) = state.sessions.get_or_create(req.conversation_id).await;
    let reply = session.lock().await.submit(&message).await?;

    Ok(Json(ChatReply {
        success: true,
        response: reply.text,
        conversation_id,
        model: reply.model,
        tokens_used: reply.usage.as_ref().map(|u| u.total_tokens),
        usage: reply.usage,
        learned: reply.learned.len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Empties the transcript of a conversation; memory is kept
pub async fn handle_clear(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(req): Json<ConversationRequest>,
) -> Result<Json<Ack>, ApiError> {
    authorize(&state, &headers)?;

    if let Some(id) = req.conversation_id.as_deref() {
        if let Some(session) = state.sessions.get(id).await {
            session.lock().await.clear();
        }
    }
    Ok(Json(Ack {
        success: true,
        message: "Conversation cleared".to_string(),
    }))
}

/// Forgets all memory, and the transcript of the given conversation
pub async fn handle_reset(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(req): Json<ConversationRequest>,
) -> Result<Json<Ack>, ApiError> {
    authorize(&state, &headers)?;

    let existing = match req.conversation_id.as_deref() {
        Some(id) => state.sessions.get(id).await,
        None => None,
    };
    match existing {
        Some(session) => session.lock().await.reset().await,
        None => state.sessions.factory().create().reset().await,
    }
    Ok(Json(Ack {
        success: true,
        message: "Memory reset".to_string(),
    }))
}

/// Reports the model, credential presence, live conversations and memory size
pub async fn handle_status(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, ApiError> {
    authorize(&state, &headers)?;

    let factory = state.sessions.factory();
    let memory = {
        let store = factory.memory().read().await;
        MemorySummary {
            preference: store.count(MemoryCategory::Preference),
            goal: store.count(MemoryCategory::Goal),
            project: store.count(MemoryCategory::Project),
            summary: store.count(MemoryCategory::Summary),
        }
    };
    Ok(Json(StatusResponse {
        status: if state.api_configured {
            "healthy".to_string()
        } else {
            "unconfigured".to_string()
        },
        model: factory.model().to_string(),
        api_configured: state.api_configured,
        conversations_active: state.sessions.len().await,
        memory,
    }))
}

pub async fn handle_models(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Json<ModelsResponse>, ApiError> {
    authorize(&state, &headers)?;

    Ok(Json(ModelsResponse {
        models: KNOWN_MODELS
            .iter()
            .map(|(id, name)| ModelInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect(),
        current: state.sessions.factory().model().to_string(),
    }))
}
