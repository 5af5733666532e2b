use anyhow::Result;
use async_trait::async_trait;

use crate::models::blog::{BlogPost, BlogPostPatch, NewBlogPost};
use crate::models::chat::{ChatMessage, ChatSettings, ChatSettingsPatch, NewChatMessage};
use crate::models::gallery::{GalleryImage, GalleryImagePatch, NewGalleryImage};
use crate::models::user::{NewUser, User};

pub mod memory;

pub use memory::MemStorage;

/// CRUD contract shared by every storage backend. Absence is signalled with
/// `None` or `false`, never with an error; `Err` is reserved for backend
/// failures and constraint violations such as a duplicate username.
///
/// List operations order newest-first by creation timestamp. Filtering
/// (published-only, per-visitor history) is the store's responsibility,
/// not the route layer's.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: i32) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: NewUser) -> Result<User>;

    // Blog posts
    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost>;
    async fn get_blog_post(&self, id: i32) -> Result<Option<BlogPost>>;
    async fn list_blog_posts(&self, limit: usize, offset: usize) -> Result<Vec<BlogPost>>;
    async fn list_published_blog_posts(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<BlogPost>>;
    async fn update_blog_post(&self, id: i32, patch: BlogPostPatch) -> Result<Option<BlogPost>>;
    async fn delete_blog_post(&self, id: i32) -> Result<bool>;

    // Gallery images
    async fn create_gallery_image(&self, image: NewGalleryImage) -> Result<GalleryImage>;
    async fn get_gallery_image(&self, id: i32) -> Result<Option<GalleryImage>>;
    async fn list_gallery_images(&self, limit: usize, offset: usize) -> Result<Vec<GalleryImage>>;
    async fn update_gallery_image(
        &self,
        id: i32,
        patch: GalleryImagePatch,
    ) -> Result<Option<GalleryImage>>;
    async fn delete_gallery_image(&self, id: i32) -> Result<bool>;

    // Chat
    async fn save_chat_message(&self, message: NewChatMessage) -> Result<ChatMessage>;
    /// Trailing `limit` turns for a visitor, oldest first.
    async fn chat_history(&self, visitor_id: &str, limit: usize) -> Result<Vec<ChatMessage>>;

    // Chat settings (singleton)
    async fn chat_settings(&self) -> Result<ChatSettings>;
    async fn update_chat_settings(&self, patch: ChatSettingsPatch) -> Result<ChatSettings>;
}
