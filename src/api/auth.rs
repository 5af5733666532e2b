use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, LoginRequest, RegisterRequest, validation};
use crate::models::user::{NewUser, User};
use crate::services::password;

/// Session key holding the logged-in user's id.
pub const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Middleware
// ============================================================================

/// Gate for the admin routes. Anonymous visitors and non-admin accounts both
/// get 403; the admin surface does not distinguish the two cases.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match current_user(&state, &session).await? {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        _ => Err(ApiError::forbidden()),
    }
}

/// Resolve the session to a user record, if any. A stale session pointing at
/// a deleted user counts as anonymous.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };

    let user = state
        .store()
        .get_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?;

    Ok(user)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
/// Create an account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_username(&payload.username)?;
    validation::validate_password(&payload.password)?;

    if state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check username: {e}")))?
        .is_some()
    {
        return Err(ApiError::validation("Username already exists"));
    }

    let password_hash = password::hash(&payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;

    let user = state
        .store()
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            is_admin: payload.is_admin,
        })
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("Registered user '{}'", user.username);

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/login
/// Authenticate with username and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?;

    // Verify even when the user is unknown so both paths take similar time.
    let is_valid = match &user {
        Some(user) => password::verify(&payload.password, &user.password_hash)
            .await
            .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?,
        None => false,
    };

    let Some(user) = user.filter(|_| is_valid) else {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(user))
}

/// POST /api/logout
/// Invalidate the current session.
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    StatusCode::OK
}

/// GET /api/user
/// The logged-in user, or 401 for anonymous visitors.
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<User>, ApiError> {
    current_user(&state, &session)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
