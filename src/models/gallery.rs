use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A gallery entry. Images are externally hosted; only the URL is stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGalleryImage {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImagePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
