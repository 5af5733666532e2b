use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::Storage;
use crate::models::blog::{BlogPost, BlogPostPatch, NewBlogPost};
use crate::models::chat::{ChatMessage, ChatSettings, ChatSettingsPatch, NewChatMessage};
use crate::models::gallery::{GalleryImage, GalleryImagePatch, NewGalleryImage};
use crate::models::user::{NewUser, User};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly assistant for an animation \
studio. Answer questions about our services and production process, help visitors \
scope their project ideas, and offer to connect them with the team when a question \
falls outside your knowledge.";

const DEFAULT_MAX_HISTORY_LENGTH: i32 = 10;

/// In-memory storage backend. Tables are plain ordered maps behind a single
/// `RwLock`; ids are handed out by per-table counters and are strictly
/// increasing for the lifetime of the process. Nothing survives a restart.
pub struct MemStorage {
    inner: RwLock<Tables>,
}

struct Tables {
    users: BTreeMap<i32, User>,
    next_user_id: i32,

    blog_posts: BTreeMap<i32, BlogPost>,
    next_blog_post_id: i32,

    gallery_images: BTreeMap<i32, GalleryImage>,
    next_gallery_image_id: i32,

    chat_messages: BTreeMap<i32, ChatMessage>,
    next_chat_message_id: i32,

    chat_settings: ChatSettings,
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStorage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables {
                users: BTreeMap::new(),
                next_user_id: 1,
                blog_posts: BTreeMap::new(),
                next_blog_post_id: 1,
                gallery_images: BTreeMap::new(),
                next_gallery_image_id: 1,
                chat_messages: BTreeMap::new(),
                next_chat_message_id: 1,
                chat_settings: ChatSettings {
                    system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
                    max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
                    updated_at: Utc::now(),
                },
            }),
        }
    }
}

/// Newest first. Ties on the timestamp fall back to the id so ordering stays
/// deterministic for records created within the same instant.
fn page<T: Clone>(
    items: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32),
    limit: usize,
    offset: usize,
) -> Vec<T> {
    let mut all: Vec<T> = items.collect();
    all.sort_by_key(|item| std::cmp::Reverse(key(item)));
    all.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: i32) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.inner.write().await;
        anyhow::ensure!(
            !tables.users.values().any(|u| u.username == user.username),
            "username '{}' already exists",
            user.username
        );

        let id = tables.next_user_id;
        tables.next_user_id += 1;

        let user = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn create_blog_post(&self, post: NewBlogPost) -> Result<BlogPost> {
        let mut tables = self.inner.write().await;
        let id = tables.next_blog_post_id;
        tables.next_blog_post_id += 1;

        let now = Utc::now();
        let post = BlogPost {
            id,
            title: post.title,
            content: post.content,
            category: post.category,
            author: post.author,
            is_draft: post.is_draft,
            read_time: post.read_time,
            created_at: now,
            updated_at: now,
        };
        tables.blog_posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_blog_post(&self, id: i32) -> Result<Option<BlogPost>> {
        Ok(self.inner.read().await.blog_posts.get(&id).cloned())
    }

    async fn list_blog_posts(&self, limit: usize, offset: usize) -> Result<Vec<BlogPost>> {
        let tables = self.inner.read().await;
        Ok(page(
            tables.blog_posts.values().cloned(),
            |post| (post.created_at, post.id),
            limit,
            offset,
        ))
    }

    async fn list_published_blog_posts(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<BlogPost>> {
        let tables = self.inner.read().await;
        Ok(page(
            tables
                .blog_posts
                .values()
                .filter(|post| !post.is_draft)
                .cloned(),
            |post| (post.created_at, post.id),
            limit,
            offset,
        ))
    }

    async fn update_blog_post(&self, id: i32, patch: BlogPostPatch) -> Result<Option<BlogPost>> {
        let mut tables = self.inner.write().await;
        let Some(post) = tables.blog_posts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(category) = patch.category {
            post.category = category;
        }
        if let Some(author) = patch.author {
            post.author = author;
        }
        if let Some(is_draft) = patch.is_draft {
            post.is_draft = is_draft;
        }
        if let Some(read_time) = patch.read_time {
            post.read_time = Some(read_time);
        }
        post.updated_at = Utc::now();

        Ok(Some(post.clone()))
    }

    async fn delete_blog_post(&self, id: i32) -> Result<bool> {
        Ok(self.inner.write().await.blog_posts.remove(&id).is_some())
    }

    async fn create_gallery_image(&self, image: NewGalleryImage) -> Result<GalleryImage> {
        let mut tables = self.inner.write().await;
        let id = tables.next_gallery_image_id;
        tables.next_gallery_image_id += 1;

        let image = GalleryImage {
            id,
            title: image.title,
            description: image.description,
            image_url: image.image_url,
            uploaded_at: Utc::now(),
        };
        tables.gallery_images.insert(id, image.clone());
        Ok(image)
    }

    async fn get_gallery_image(&self, id: i32) -> Result<Option<GalleryImage>> {
        Ok(self.inner.read().await.gallery_images.get(&id).cloned())
    }

    async fn list_gallery_images(&self, limit: usize, offset: usize) -> Result<Vec<GalleryImage>> {
        let tables = self.inner.read().await;
        Ok(page(
            tables.gallery_images.values().cloned(),
            |image| (image.uploaded_at, image.id),
            limit,
            offset,
        ))
    }

    async fn update_gallery_image(
        &self,
        id: i32,
        patch: GalleryImagePatch,
    ) -> Result<Option<GalleryImage>> {
        let mut tables = self.inner.write().await;
        let Some(image) = tables.gallery_images.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            image.title = title;
        }
        if let Some(description) = patch.description {
            image.description = Some(description);
        }
        if let Some(image_url) = patch.image_url {
            image.image_url = image_url;
        }

        Ok(Some(image.clone()))
    }

    async fn delete_gallery_image(&self, id: i32) -> Result<bool> {
        Ok(self
            .inner
            .write()
            .await
            .gallery_images
            .remove(&id)
            .is_some())
    }

    async fn save_chat_message(&self, message: NewChatMessage) -> Result<ChatMessage> {
        let mut tables = self.inner.write().await;
        let id = tables.next_chat_message_id;
        tables.next_chat_message_id += 1;

        let message = ChatMessage {
            id,
            visitor_id: message.visitor_id,
            message: message.message,
            ai_response: message.ai_response,
            timestamp: Utc::now(),
        };
        tables.chat_messages.insert(id, message.clone());
        Ok(message)
    }

    async fn chat_history(&self, visitor_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        let tables = self.inner.read().await;
        let mut history: Vec<ChatMessage> = tables
            .chat_messages
            .values()
            .filter(|msg| msg.visitor_id == visitor_id)
            .cloned()
            .collect();
        history.sort_by_key(|msg| (msg.timestamp, msg.id));

        // Keep the trailing window so the most recent turns survive the cap.
        let start = history.len().saturating_sub(limit);
        Ok(history.split_off(start))
    }

    async fn chat_settings(&self) -> Result<ChatSettings> {
        Ok(self.inner.read().await.chat_settings.clone())
    }

    async fn update_chat_settings(&self, patch: ChatSettingsPatch) -> Result<ChatSettings> {
        let mut tables = self.inner.write().await;

        if let Some(system_prompt) = patch.system_prompt {
            tables.chat_settings.system_prompt = system_prompt;
        }
        if let Some(max_history_length) = patch.max_history_length {
            tables.chat_settings.max_history_length = max_history_length;
        }
        tables.chat_settings.updated_at = Utc::now();

        Ok(tables.chat_settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(title: &str, is_draft: bool) -> NewBlogPost {
        NewBlogPost {
            title: title.to_string(),
            content: "content".to_string(),
            category: "News".to_string(),
            author: "Aki".to_string(),
            is_draft,
            read_time: Some(4),
        }
    }

    #[tokio::test]
    async fn blog_ids_are_strictly_increasing() {
        let store = MemStorage::new();
        let mut last = 0;
        for i in 0..5 {
            let post = store
                .create_blog_post(sample_post(&format!("post {i}"), false))
                .await
                .unwrap();
            assert!(post.id > last);
            last = post.id;
        }
    }

    #[tokio::test]
    async fn published_listing_excludes_drafts() {
        let store = MemStorage::new();
        store
            .create_blog_post(sample_post("published", false))
            .await
            .unwrap();
        store
            .create_blog_post(sample_post("draft", true))
            .await
            .unwrap();

        let published = store.list_published_blog_posts(10, 0).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "published");

        let all = store.list_blog_posts(10, 0).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn delete_missing_post_reports_not_found() {
        let store = MemStorage::new();
        store
            .create_blog_post(sample_post("keep me", false))
            .await
            .unwrap();

        assert!(!store.delete_blog_post(999).await.unwrap());
        assert_eq!(store.list_blog_posts(10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn patch_preserves_absent_fields() {
        let store = MemStorage::new();
        let post = store
            .create_blog_post(sample_post("original title", true))
            .await
            .unwrap();

        let updated = store
            .update_blog_post(
                post.id,
                BlogPostPatch {
                    is_draft: Some(false),
                    ..BlogPostPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!updated.is_draft);
        assert_eq!(updated.title, "original title");
        assert_eq!(updated.content, "content");
        assert_eq!(updated.read_time, Some(4));
        assert_eq!(updated.created_at, post.created_at);
    }

    #[tokio::test]
    async fn update_missing_post_returns_none() {
        let store = MemStorage::new();
        let result = store
            .update_blog_post(42, BlogPostPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = MemStorage::new();
        let user = NewUser {
            username: "alice".to_string(),
            email: None,
            password_hash: "hash".to_string(),
            is_admin: false,
        };
        store.create_user(user.clone()).await.unwrap();
        assert!(store.create_user(user).await.is_err());
    }

    #[tokio::test]
    async fn chat_history_is_ordered_and_capped() {
        let store = MemStorage::new();
        for i in 0..6 {
            store
                .save_chat_message(NewChatMessage {
                    visitor_id: "v1".to_string(),
                    message: format!("turn {i}"),
                    ai_response: Some(format!("reply {i}")),
                })
                .await
                .unwrap();
        }
        store
            .save_chat_message(NewChatMessage {
                visitor_id: "someone-else".to_string(),
                message: "other conversation".to_string(),
                ai_response: None,
            })
            .await
            .unwrap();

        let history = store.chat_history("v1", 4).await.unwrap();
        assert_eq!(history.len(), 4);
        // Oldest-to-newest, and the trailing window keeps the latest turns.
        assert_eq!(history[0].message, "turn 2");
        assert_eq!(history[3].message, "turn 5");
        assert!(history.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn chat_settings_patch_is_partial() {
        let store = MemStorage::new();
        let before = store.chat_settings().await.unwrap();

        let updated = store
            .update_chat_settings(ChatSettingsPatch {
                max_history_length: Some(3),
                ..ChatSettingsPatch::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.max_history_length, 3);
        assert_eq!(updated.system_prompt, before.system_prompt);
    }

    #[tokio::test]
    async fn gallery_listing_is_newest_first() {
        let store = MemStorage::new();
        for i in 0..3 {
            store
                .create_gallery_image(NewGalleryImage {
                    title: format!("image {i}"),
                    description: None,
                    image_url: format!("https://cdn.example.com/{i}.png"),
                })
                .await
                .unwrap();
        }

        let images = store.list_gallery_images(10, 0).await.unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].title, "image 2");
        assert_eq!(images[2].title, "image 0");

        let offset_page = store.list_gallery_images(1, 1).await.unwrap();
        assert_eq!(offset_page.len(), 1);
        assert_eq!(offset_page[0].title, "image 1");

        let by_id = store.get_gallery_image(images[0].id).await.unwrap();
        assert_eq!(by_id.unwrap().title, "image 2");
        assert!(store.get_gallery_image(999).await.unwrap().is_none());
    }
}
