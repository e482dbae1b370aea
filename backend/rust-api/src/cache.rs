//! Short-lived key/value state: idempotent submission replies and login
//! failure counters. Redis in production, a process-local map in tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;

use crate::metrics::track_cache_operation;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn ping(&self) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// Increments a counter, starting its TTL window on the first hit.
    async fn incr_window(&self, key: &str, ttl_seconds: u64) -> Result<i64>;

    async fn del(&self, key: &str) -> Result<()>;
}

// INCR and EXPIRE in one step. A counter left without a TTL is given one,
// otherwise it would never expire.
const INCR_WINDOW_SCRIPT: &str = r#"
    local count = redis.call('INCR', KEYS[1])
    if count == 1 or redis.call('TTL', KEYS[1]) == -1 then
        redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
    end
    return count
"#;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects and verifies the connection with a PING.
    pub async fn connect(client: redis::Client) -> Result<Self> {
        tracing::info!("Attempting to connect to Redis...");

        let conn = tokio::time::timeout(Duration::from_secs(30), ConnectionManager::new(client))
            .await
            .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

        let cache = Self { conn };
        tokio::time::timeout(Duration::from_secs(5), cache.ping())
            .await
            .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

        tracing::info!("Redis connection established successfully");
        Ok(cache)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        track_cache_operation("get", async {
            let mut conn = self.conn.clone();
            redis::cmd("GET")
                .arg(key)
                .query_async::<Option<String>>(&mut conn)
                .await
                .context("Failed to read from Redis")
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        track_cache_operation("setex", async {
            let mut conn = self.conn.clone();
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_seconds)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to write to Redis")
        })
        .await
    }

    async fn incr_window(&self, key: &str, ttl_seconds: u64) -> Result<i64> {
        track_cache_operation("incr", async {
            let mut conn = self.conn.clone();
            let count: i64 = redis::Script::new(INCR_WINDOW_SCRIPT)
                .key(key)
                .arg(ttl_seconds)
                .invoke_async(&mut conn)
                .await
                .context("Failed to increment counter")?;
            Ok(count)
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<()> {
        track_cache_operation("del", async {
            let mut conn = self.conn.clone();
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to delete key")
        })
        .await
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn live<'a>(entries: &'a HashMap<String, Entry>, key: &str) -> Option<&'a Entry> {
    entries
        .get(key)
        .filter(|entry| entry.expires_at > Instant::now())
}

#[async_trait]
impl Cache for MemoryCache {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(live(&entries, key).map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn incr_window(&self, key: &str, ttl_seconds: u64) -> Result<i64> {
        let mut entries = self.entries.lock().await;
        let (count, expires_at) = match live(&entries, key) {
            Some(entry) => {
                let current: i64 = entry
                    .value
                    .parse()
                    .context("Counter holds a non-integer value")?;
                (current + 1, entry.expires_at)
            }
            None => (1, Instant::now() + Duration::from_secs(ttl_seconds)),
        };
        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );
        Ok(count)
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
