use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, ListQuery, auth, validation};
use crate::models::blog::{BlogPost, BlogPostPatch, NewBlogPost};

const DEFAULT_LIST_LIMIT: usize = 10;

/// GET /api/blog
/// Published posts, newest first. Admin sessions also see drafts.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let limit = validation::validate_limit(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))?;
    let offset = query.offset.unwrap_or(0);

    let is_admin = auth::current_user(&state, &session)
        .await?
        .is_some_and(|user| user.is_admin);

    let posts = if is_admin {
        state.store().list_blog_posts(limit, offset).await?
    } else {
        state
            .store()
            .list_published_blog_posts(limit, offset)
            .await?
    };

    Ok(Json(posts))
}

/// GET /api/blog/{id}
/// Drafts are 403 for everyone but admins, so their ids do not leak content.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<BlogPost>, ApiError> {
    validation::validate_id(id)?;

    let post = state
        .store()
        .get_blog_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog post", id))?;

    if post.is_draft {
        let is_admin = auth::current_user(&state, &session)
            .await?
            .is_some_and(|user| user.is_admin);
        if !is_admin {
            return Err(ApiError::Forbidden(
                "This post is not published".to_string(),
            ));
        }
    }

    Ok(Json(post))
}

/// GET /api/admin/blog
/// Every post, drafts included.
pub async fn admin_list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    let limit = validation::validate_limit(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))?;
    let offset = query.offset.unwrap_or(0);

    let posts = state.store().list_blog_posts(limit, offset).await?;
    Ok(Json(posts))
}

/// POST /api/admin/blog
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewBlogPost>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_required_text(Some(payload.title.as_str()), "Title")?;
    validation::validate_required_text(Some(payload.content.as_str()), "Content")?;
    validation::validate_required_text(Some(payload.category.as_str()), "Category")?;
    validation::validate_required_text(Some(payload.author.as_str()), "Author")?;

    let post = state.store().create_blog_post(payload).await?;

    tracing::info!("Created blog post {} '{}'", post.id, post.title);

    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/admin/blog/{id}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<BlogPostPatch>,
) -> Result<Json<BlogPost>, ApiError> {
    validation::validate_id(id)?;

    if let Some(title) = patch.title.as_deref() {
        validation::validate_required_text(Some(title), "Title")?;
    }

    let post = state
        .store()
        .update_blog_post(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog post", id))?;

    Ok(Json(post))
}

/// DELETE /api/admin/blog/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    validation::validate_id(id)?;

    if state.store().delete_blog_post(id).await? {
        tracing::info!("Deleted blog post {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Blog post", id))
    }
}
