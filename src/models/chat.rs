use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat turn. Append-only; `ai_response` stays empty when the upstream
/// completion call failed for this turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i32,
    /// Groups turns into a conversation without requiring login.
    pub visitor_id: String,
    pub message: String,
    pub ai_response: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub visitor_id: String,
    pub message: String,
    pub ai_response: Option<String>,
}

/// Singleton record read by the chat integration on every turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub system_prompt: String,
    /// Upper bound on how many prior turns are replayed into the prompt.
    pub max_history_length: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettingsPatch {
    pub system_prompt: Option<String>,
    pub max_history_length: Option<i32>,
}
