use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::{CompletionClient, OpenAiClient};
use crate::config::Config;
use crate::db::{MemStorage, Storage};
use crate::models::user::NewUser;
use crate::services::{ChatService, password};

/// Application-wide dependencies, shared by every request handler.
pub struct SharedState {
    pub config: Config,

    pub store: Arc<dyn Storage>,

    pub chat: Arc<ChatService>,
}

impl SharedState {
    /// Wire up the production stack: in-memory storage plus the hosted
    /// completion client, with the completion API key taken from the
    /// environment.
    pub async fn new(config: Config) -> Result<Self> {
        let api_key = Config::completion_api_key();
        if api_key.is_none() {
            warn!("OPENAI_API_KEY not set; chat replies will degrade to the fallback message");
        }

        let completions: Arc<dyn CompletionClient> =
            Arc::new(OpenAiClient::new(api_key, config.chat.clone()));
        Self::with_completion_client(config, completions).await
    }

    /// Same wiring with an injected completion client. Tests use this to
    /// simulate upstream failures without network access.
    pub async fn with_completion_client(
        config: Config,
        completions: Arc<dyn CompletionClient>,
    ) -> Result<Self> {
        let store: Arc<dyn Storage> = Arc::new(MemStorage::new());

        bootstrap_admin(&config, store.as_ref()).await?;

        let chat = Arc::new(ChatService::new(store.clone(), completions));

        Ok(Self {
            config,
            store,
            chat,
        })
    }
}

/// Seed the bootstrap admin account, the in-memory counterpart of the
/// database migration that ships a default admin user.
async fn bootstrap_admin(config: &Config, store: &dyn Storage) -> Result<()> {
    if store
        .get_user_by_username(&config.auth.bootstrap_username)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let password_hash = password::hash(&config.auth.bootstrap_password).await?;
    store
        .create_user(NewUser {
            username: config.auth.bootstrap_username.clone(),
            email: None,
            password_hash,
            is_admin: true,
        })
        .await?;

    info!(
        "Seeded bootstrap admin account '{}'",
        config.auth.bootstrap_username
    );
    Ok(())
}
