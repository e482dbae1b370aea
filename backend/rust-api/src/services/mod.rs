use std::sync::Arc;

use crate::cache::{Cache, RedisCache};
use crate::config::Config;
use crate::middlewares::auth::JwtService;
use crate::storage::{MongoStore, Store};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub cache: Arc<dyn Cache>,
    pub jwt: JwtService,
}

impl AppState {
    /// Connects to MongoDB and Redis and makes sure the indexes exist.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        tracing::info!("Connecting to MongoDB...");
        let store = MongoStore::connect(&config.mongo_uri, &config.mongo_database).await?;
        store.ensure_indexes().await?;
        tracing::info!("MongoDB connection established");

        let redis_client = redis::Client::open(config.redis_uri.as_str())?;
        let cache = RedisCache::connect(redis_client).await?;

        Ok(Self::with_backends(config, Arc::new(store), Arc::new(cache)))
    }

    pub fn with_backends(config: Config, store: Arc<dyn Store>, cache: Arc<dyn Cache>) -> Self {
        let jwt = JwtService::new(&config.jwt_secret, config.jwt_ttl_seconds);
        Self {
            config,
            store,
            cache,
            jwt,
        }
    }
}

pub mod auth_service;
pub mod exercise_service;
pub mod progress_aggregator;
pub mod submission_service;
pub mod user_service;
