//! Server module exposing assistant sessions via a REST API
//!
//! Each conversation id maps to its own session; all sessions share one
//! memory store. Supports optional Bearer authentication and permissive CORS.
//!
//! | Method | Path | Body |
//! |---|---|---|
//! | POST | `/api/chat` | `{"message": "...", "conversation_id": "..."}` |
//! | POST | `/api/clear` | `{"conversation_id": "..."}` |
//! | POST | `/api/reset` | `{"conversation_id": "..."}` |
//! | GET | `/api/status` | |
//! | GET | `/api/models` | |

mod handlers;
mod registry;
mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::error::LLMError;
use handlers::{handle_chat, handle_clear, handle_models, handle_reset, handle_status};

pub use handlers::ApiError;
pub use registry::{SessionRegistry, DEFAULT_IDLE_TTL};
pub use types::{
    Ack, ChatReply, ChatRequest, ConversationRequest, ErrorBody, MemorySummary, ModelInfo,
    ModelsResponse, StatusResponse,
};

/// How often idle conversations are swept while serving.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Main server struct that owns the session registry and authentication
pub struct Server {
    sessions: Arc<SessionRegistry>,
    /// Optional authentication key for API requests
    pub auth_key: Option<String>,
    /// Whether the provider was built with a credential
    pub api_configured: bool,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    sessions: Arc<SessionRegistry>,
    auth_key: Option<String>,
    api_configured: bool,
}

impl Server {
    /// Creates a new server serving the conversations of `sessions`
    ///
    /// # Arguments
    /// * `sessions` - Registry creating and holding one session per conversation id
    pub fn new(sessions: SessionRegistry) -> Self {
        Self {
            sessions: Arc::new(sessions),
            auth_key: None,
            api_configured: true,
        }
    }

    /// Sets the authentication key required for API requests
    ///
    /// # Arguments
    /// * `key` - API key that clients must provide in Authorization header
    pub fn with_auth_key(mut self, key: impl Into<String>) -> Self {
        self.auth_key = Some(key.into());
        self
    }

    pub fn with_api_configured(mut self, configured: bool) -> Self {
        self.api_configured = configured;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The routes of this server, ready to serve or to drive in tests
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/chat", post(handle_chat))
            .route("/api/clear", post(handle_clear))
            .route("/api/reset", post(handle_reset))
            .route("/api/status", get(handle_status))
            .route("/api/models", get(handle_models))
            .layer(CorsLayer::permissive())
            .with_state(ServerState {
                sessions: self.sessions.clone(),
                auth_key: self.auth_key.clone(),
                api_configured: self.api_configured,
            })
    }

    /// Starts the server and listens for requests on the specified address
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g. "127.0.0.1:5000")
    ///
    /// # Returns
    /// * `Ok(())` when the server shuts down
    /// * `Err(LLMError)` if the address cannot be bound
    pub async fn run(self, addr: &str) -> Result<(), LLMError> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| LLMError::InvalidRequest(format!("cannot bind {addr}: {e}")))?;
        log::info!("listening on {addr}");

        let sweeper = {
            let sessions = self.sessions.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
                loop {
                    ticker.tick().await;
                    sessions.sweep_idle().await;
                }
            })
        };

        let served = axum::serve(listener, app)
            .await
            .map_err(|e| LLMError::TransportFailure(e.to_string()));
        sweeper.abort();
        served
    }
}
