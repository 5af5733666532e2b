use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, AppState, ListQuery, validation};
use crate::models::gallery::{GalleryImage, GalleryImagePatch, NewGalleryImage};

const DEFAULT_LIST_LIMIT: usize = 20;

/// GET /api/gallery
/// Public, newest upload first.
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<GalleryImage>>, ApiError> {
    let limit = validation::validate_limit(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))?;
    let offset = query.offset.unwrap_or(0);

    let images = state.store().list_gallery_images(limit, offset).await?;
    Ok(Json(images))
}

/// POST /api/admin/gallery
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewGalleryImage>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_required_text(Some(payload.title.as_str()), "Title")?;
    validation::validate_required_text(Some(payload.image_url.as_str()), "Image URL")?;

    let image = state.store().create_gallery_image(payload).await?;

    tracing::info!("Created gallery image {} '{}'", image.id, image.title);

    Ok((StatusCode::CREATED, Json(image)))
}

/// PATCH /api/admin/gallery/{id}
pub async fn update_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<GalleryImagePatch>,
) -> Result<Json<GalleryImage>, ApiError> {
    validation::validate_id(id)?;

    if let Some(title) = patch.title.as_deref() {
        validation::validate_required_text(Some(title), "Title")?;
    }

    let image = state
        .store()
        .update_gallery_image(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Gallery image", id))?;

    Ok(Json(image))
}

/// DELETE /api/admin/gallery/{id}
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    validation::validate_id(id)?;

    if state.store().delete_gallery_image(id).await? {
        tracing::info!("Deleted gallery image {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Gallery image", id))
    }
}
