use serde::{Deserialize, Serialize};

use crate::chat::Usage;
use crate::error::ErrorKind;

/// Request payload for the chat endpoint
#[derive(Deserialize)]
pub struct ChatRequest {
    /// The user's message
    #[serde(default)]
    pub message: Option<String>,
    /// Conversation to continue; a new one is started when absent
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response payload from the chat endpoint
#[derive(Serialize, Deserialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    pub conversation_id: String,
    pub model: String,
    /// Total tokens reported by the provider
    pub tokens_used: Option<u32>,
    pub usage: Option<Usage>,
    /// Number of facts learned from this message
    pub learned: usize,
    /// RFC 3339 time the reply was produced
    pub timestamp: String,
}

/// Request payload for the clear and reset endpoints
#[derive(Deserialize, Default)]
pub struct ConversationRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Acknowledgement for management calls
#[derive(Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

/// Error body returned with every non-2xx status
#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: Option<ErrorKind>,
    /// Remediation advice for the operator
    pub hint: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct MemorySummary {
    pub preference: usize,
    pub goal: usize,
    pub project: usize,
    pub summary: usize,
}

/// Response payload from the status endpoint
#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub model: String,
    /// Whether the provider has a credential to work with
    pub api_configured: bool,
    pub conversations_active: usize,
    pub memory: MemorySummary,
}

/// Single entry of the models endpoint
#[derive(Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub current: String,
}
