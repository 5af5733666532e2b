use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, ChatRequest, ChatResponse, IdeasRequest, IdeasResponse, validation};
use crate::models::chat::{ChatMessage, ChatSettings, ChatSettingsPatch};

const SESSION_VISITOR_KEY: &str = "visitor_id";

/// POST /api/chat
/// One turn of the widget conversation. Anonymous visitors get a random
/// conversation id pinned to their session.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = validation::validate_required_text(payload.message.as_deref(), "Message")?;

    let visitor_id = match payload.user_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => session_visitor_id(&session).await?,
    };

    let reply = state
        .chat()
        .respond(&visitor_id, message)
        .await
        .map_err(|e| ApiError::internal(format!("Chat turn failed: {e}")))?;

    Ok(Json(ChatResponse { message: reply }))
}

/// GET /api/chat/{visitor_id}
/// Recent turns for a conversation, oldest first, capped at the configured
/// history length. Conversation ids are unguessable, so this stays public.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(visitor_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let settings = state.store().chat_settings().await?;
    let limit = usize::try_from(settings.max_history_length.max(0)).unwrap_or(0);

    let history = state.store().chat_history(&visitor_id, limit).await?;
    Ok(Json(history))
}

/// GET /api/admin/chat-settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChatSettings>, ApiError> {
    Ok(Json(state.store().chat_settings().await?))
}

/// PATCH /api/admin/chat-settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<ChatSettingsPatch>,
) -> Result<Json<ChatSettings>, ApiError> {
    if let Some(prompt) = patch.system_prompt.as_deref() {
        validation::validate_required_text(Some(prompt), "System prompt")?;
    }

    if let Some(length) = patch.max_history_length
        && length < 1
    {
        return Err(ApiError::validation(
            "Max history length must be at least 1",
        ));
    }

    let settings = state.store().update_chat_settings(patch).await?;

    tracing::info!(
        "Updated chat settings, history length {}",
        settings.max_history_length
    );

    Ok(Json(settings))
}

/// POST /api/generate-blog-ideas
pub async fn generate_blog_ideas(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IdeasRequest>,
) -> Result<Json<IdeasResponse>, ApiError> {
    let topic = validation::validate_required_text(payload.topic.as_deref(), "Topic")?;

    let ideas = state.chat().generate_blog_ideas(topic).await;
    Ok(Json(IdeasResponse { ideas }))
}

async fn session_visitor_id(session: &Session) -> Result<String, ApiError> {
    let existing = session
        .get::<String>(SESSION_VISITOR_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = uuid::Uuid::new_v4().to_string();
    session
        .insert(SESSION_VISITOR_KEY, id.clone())
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    Ok(id)
}
