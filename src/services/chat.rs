use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::clients::{ChatTurn, CompletionClient};
use crate::db::Storage;
use crate::models::chat::NewChatMessage;

/// Reply returned when the completion provider is unreachable. Upstream
/// failures never surface as raw errors to the widget.
pub const FALLBACK_REPLY: &str =
    "I'm having trouble connecting right now. Please try again later.";

const IDEAS_SYSTEM_PROMPT: &str = "You are a creative content strategist for an \
animation studio. Generate 5 blog post ideas related to the given topic that would \
be relevant for the studio's audience: animation techniques, industry trends, \
project showcases, and creative processes. Make titles catchy and SEO-friendly. \
Respond with a JSON object of the form {\"ideas\": [\"...\"]}.";

/// Orchestrates one chat turn: settings, bounded history, upstream call,
/// persistence. The turn is persisted exactly once, after the upstream call
/// resolves, so a failed call still records the visitor's message.
pub struct ChatService {
    store: Arc<dyn Storage>,
    completions: Arc<dyn CompletionClient>,
}

impl ChatService {
    pub fn new(store: Arc<dyn Storage>, completions: Arc<dyn CompletionClient>) -> Self {
        Self { store, completions }
    }

    pub async fn respond(&self, visitor_id: &str, message: &str) -> Result<String> {
        let settings = self.store.chat_settings().await?;
        let history_limit = usize::try_from(settings.max_history_length.max(0)).unwrap_or(0);
        let history = self.store.chat_history(visitor_id, history_limit).await?;

        let mut turns = Vec::with_capacity(history.len() * 2 + 2);
        turns.push(ChatTurn::system(settings.system_prompt));
        for entry in history {
            turns.push(ChatTurn::user(entry.message));
            if let Some(reply) = entry.ai_response {
                turns.push(ChatTurn::assistant(reply));
            }
        }
        turns.push(ChatTurn::user(message.to_string()));

        let (reply, stored_reply) = match self.completions.complete(turns).await {
            Ok(reply) => (reply.clone(), Some(reply)),
            Err(err) => {
                warn!(visitor_id, "completion request failed: {err}");
                (FALLBACK_REPLY.to_string(), None)
            }
        };

        self.store
            .save_chat_message(NewChatMessage {
                visitor_id: visitor_id.to_string(),
                message: message.to_string(),
                ai_response: stored_reply,
            })
            .await?;

        Ok(reply)
    }

    /// Ask the provider for blog post ideas about a topic. Upstream or parse
    /// failures degrade to a single explanatory entry instead of an error.
    pub async fn generate_blog_ideas(&self, topic: &str) -> Vec<String> {
        let turns = vec![
            ChatTurn::system(IDEAS_SYSTEM_PROMPT),
            ChatTurn::user(format!("Generate 5 blog post ideas about: {topic}")),
        ];

        let content = match self.completions.complete_json(turns).await {
            Ok(content) => content,
            Err(err) => {
                warn!("blog idea generation failed: {err}");
                return vec!["Error generating blog ideas. Please try again.".to_string()];
            }
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) => value
                .get("ideas")
                .and_then(|ideas| ideas.as_array())
                .map_or_else(
                    || vec!["Failed to parse blog ideas".to_string()],
                    |ideas| {
                        ideas
                            .iter()
                            .filter_map(|idea| idea.as_str().map(str::to_string))
                            .collect()
                    },
                ),
            Err(err) => {
                warn!("blog idea response was not valid JSON: {err}");
                vec!["Failed to parse blog ideas".to_string()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::CompletionError;
    use crate::db::MemStorage;
    use async_trait::async_trait;

    struct CannedCompletions {
        reply: String,
    }

    #[async_trait]
    impl CompletionClient for CannedCompletions {
        async fn complete(&self, _turns: Vec<ChatTurn>) -> Result<String, CompletionError> {
            Ok(self.reply.clone())
        }

        async fn complete_json(&self, _turns: Vec<ChatTurn>) -> Result<String, CompletionError> {
            Ok(self.reply.clone())
        }
    }

    struct FailingCompletions;

    #[async_trait]
    impl CompletionClient for FailingCompletions {
        async fn complete(&self, _turns: Vec<ChatTurn>) -> Result<String, CompletionError> {
            Err(CompletionError::MissingApiKey)
        }

        async fn complete_json(&self, _turns: Vec<ChatTurn>) -> Result<String, CompletionError> {
            Err(CompletionError::MissingApiKey)
        }
    }

    #[tokio::test]
    async fn successful_turn_persists_message_and_reply() {
        let store = Arc::new(MemStorage::new());
        let service = ChatService::new(
            store.clone(),
            Arc::new(CannedCompletions {
                reply: "Hello from the studio!".to_string(),
            }),
        );

        let reply = service.respond("v1", "What services do you offer?").await.unwrap();
        assert_eq!(reply, "Hello from the studio!");

        let history = store.chat_history("v1", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "What services do you offer?");
        assert_eq!(history[0].ai_response.as_deref(), Some("Hello from the studio!"));
    }

    #[tokio::test]
    async fn failed_turn_returns_fallback_and_still_records_message() {
        let store = Arc::new(MemStorage::new());
        let service = ChatService::new(store.clone(), Arc::new(FailingCompletions));

        let reply = service.respond("v1", "Anyone there?").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);

        let history = store.chat_history("v1", 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "Anyone there?");
        assert!(history[0].ai_response.is_none());
    }

    #[tokio::test]
    async fn ideas_are_parsed_from_json_payload() {
        let store = Arc::new(MemStorage::new());
        let service = ChatService::new(
            store,
            Arc::new(CannedCompletions {
                reply: r#"{"ideas": ["Idea one", "Idea two"]}"#.to_string(),
            }),
        );

        let ideas = service.generate_blog_ideas("storyboarding").await;
        assert_eq!(ideas, vec!["Idea one", "Idea two"]);
    }

    #[tokio::test]
    async fn malformed_ideas_payload_degrades() {
        let store = Arc::new(MemStorage::new());
        let service = ChatService::new(
            store,
            Arc::new(CannedCompletions {
                reply: "not json".to_string(),
            }),
        );

        let ideas = service.generate_blog_ideas("storyboarding").await;
        assert_eq!(ideas, vec!["Failed to parse blog ideas"]);
    }

    #[tokio::test]
    async fn upstream_failure_degrades_ideas() {
        let store = Arc::new(MemStorage::new());
        let service = ChatService::new(store, Arc::new(FailingCompletions));

        let ideas = service.generate_blog_ideas("storyboarding").await;
        assert_eq!(ideas.len(), 1);
        assert!(ideas[0].starts_with("Error generating blog ideas"));
    }
}
