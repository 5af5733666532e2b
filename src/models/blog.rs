use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post. Drafts are only visible to admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub category: String,
    pub author: String,
    pub is_draft: bool,
    /// Estimated read time in minutes.
    pub read_time: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub author: String,
    /// New posts start as drafts unless explicitly published.
    #[serde(default = "default_is_draft")]
    pub is_draft: bool,
    pub read_time: Option<i32>,
}

const fn default_is_draft() -> bool {
    true
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub is_draft: Option<bool>,
    pub read_time: Option<i32>,
}
