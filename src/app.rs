//! Wiring for a host shell.
//!
//! `TalynkApp` builds the shared client and cache from an [`AppConfig`] and
//! hands out the flows a front-end needs.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::auth_flow::{self, LoginFlow, SignupFlow};
use crate::services::query_cache::QueryCache;
use crate::services::queue_events::QueueEvent;
use crate::services::review_engine::{ReviewQueueEngine, ReviewQueueHandle};
use crate::services::talynk_client::TalynkClient;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared application state.
pub struct TalynkApp {
    config: AppConfig,
    client: Arc<TalynkClient>,
    cache: Arc<QueryCache>,
}

impl TalynkApp {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let client = Arc::new(TalynkClient::new(config.client_config())?);
        log::info!("[app] Using Talynk API at {}", config.api_base_url);
        Ok(Self {
            config,
            client,
            cache: Arc::new(QueryCache::new()),
        })
    }

    /// Build from `TALYNK_*` environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(AppConfig::from_env()?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<TalynkClient> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn login_flow(&self) -> LoginFlow<TalynkClient> {
        LoginFlow::new(self.client.clone(), self.cache.clone())
    }

    pub fn signup_flow(&self) -> SignupFlow<TalynkClient> {
        SignupFlow::new(self.client.clone())
    }

    pub async fn logout(&self) {
        auth_flow::logout(self.client.as_ref(), &self.cache).await;
    }

    /// Mount the review queue. Must be called inside a tokio runtime.
    pub fn start_review_queue(&self) -> (ReviewQueueHandle, mpsc::Receiver<QueueEvent>) {
        ReviewQueueEngine::start_background(self.client.clone(), self.config.queue_config())
    }

    /// Playable URL for a post's media reference.
    pub fn media_url(&self, post: &crate::models::Post) -> String {
        post.media_url(&self.config.media_base_url)
    }
}
