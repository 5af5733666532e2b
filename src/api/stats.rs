use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ActivityItem, ActivityKind, ApiError, AppState, DashboardStats};

const RECENT_ACTIVITY_SIZE: usize = 5;

/// GET /api/admin/stats
/// Content totals plus the latest additions across both content types.
pub async fn get_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    let posts = state.store().list_blog_posts(usize::MAX, 0).await?;
    let images = state.store().list_gallery_images(usize::MAX, 0).await?;

    let published = posts.iter().filter(|post| !post.is_draft).count();

    let mut activity: Vec<ActivityItem> = posts
        .iter()
        .map(|post| ActivityItem {
            kind: ActivityKind::Blog,
            id: post.id,
            title: post.title.clone(),
            date: post.created_at,
        })
        .chain(images.iter().map(|image| ActivityItem {
            kind: ActivityKind::Gallery,
            id: image.id,
            title: image.title.clone(),
            date: image.uploaded_at,
        }))
        .collect();
    activity.sort_by(|a, b| b.date.cmp(&a.date));
    activity.truncate(RECENT_ACTIVITY_SIZE);

    Ok(Json(DashboardStats {
        total_blog_posts: posts.len(),
        published_blog_posts: published,
        draft_blog_posts: posts.len() - published,
        total_gallery_images: images.len(),
        recent_activity: activity,
    }))
}
