use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::clients::CompletionClient;
use crate::config::Config;
use crate::services::ChatService;
use crate::state::SharedState;

pub mod auth;
mod blog;
mod chat;
mod error;
mod gallery;
mod stats;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn crate::db::Storage> {
        &self.shared.store
    }

    #[must_use]
    pub fn chat(&self) -> &Arc<ChatService> {
        &self.shared.chat
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared).await)
}

/// App state with an injected completion client, for tests that must not
/// reach the network.
pub async fn create_app_state_with_client(
    config: Config,
    completions: Arc<dyn CompletionClient>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_completion_client(config, completions).await?);
    Ok(create_app_state(shared).await)
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;
    let cors_origins = server.cors_allowed_origins.clone();
    let secure_cookies = server.secure_cookies;
    let session_ttl = state.config().auth.session_ttl_minutes;

    let admin_routes = create_admin_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(session_ttl)));

    let api_router = Router::new()
        .merge(admin_routes)
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::get_current_user))
        .route("/blog", get(blog::list_posts))
        .route("/blog/{id}", get(blog::get_post))
        .route("/gallery", get(gallery::list_images))
        .route("/chat", post(chat::send_message))
        .route("/chat/{visitor_id}", get(chat::get_history))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/blog", get(blog::admin_list_posts))
        .route("/admin/blog", post(blog::create_post))
        .route("/admin/blog/{id}", patch(blog::update_post))
        .route("/admin/blog/{id}", delete(blog::delete_post))
        .route("/admin/gallery", post(gallery::create_image))
        .route("/admin/gallery/{id}", patch(gallery::update_image))
        .route("/admin/gallery/{id}", delete(gallery::delete_image))
        .route("/admin/chat-settings", get(chat::get_settings))
        .route("/admin/chat-settings", patch(chat::update_settings))
        .route("/admin/stats", get(stats::get_dashboard_stats))
        .route("/generate-blog-ideas", post(chat::generate_blog_ideas))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
