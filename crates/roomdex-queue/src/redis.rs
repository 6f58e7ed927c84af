//! Redis-backed implementation of [`KeyValueStore`]

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use roomdex_config::RedisConfig;

use crate::error::{QueueError, QueueResult};
use crate::store::{KeyValueStore, StoreValue};

/// Redis store over a deadpool connection pool
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build a pooled store from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be constructed from the URL.
    pub fn new(config: &RedisConfig) -> QueueResult<Self> {
        let pool = Config::from_url(&config.url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| QueueError::store("create_pool", e))?;
        Ok(Self { pool })
    }

    async fn connection(&self, operation: &'static str) -> QueueResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::store(operation, e))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl_seconds: u64) -> QueueResult<bool> {
        let mut conn = self.connection("set_if_absent").await?;
        // SET NX EX is a single atomic command; a nil reply means the key
        // already existed
        let reply: Option<String> = deadpool_redis::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::store("set_if_absent", e))?;
        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> QueueResult<bool> {
        let mut conn = self.connection("exists").await?;
        conn.exists(key)
            .await
            .map_err(|e| QueueError::store("exists", e))
    }

    async fn delete(&self, key: &str) -> QueueResult<()> {
        let mut conn = self.connection("delete").await?;
        let _: u64 = conn
            .del(key)
            .await
            .map_err(|e| QueueError::store("delete", e))?;
        Ok(())
    }

    async fn sorted_add(&self, key: &str, score: f64, member: &str) -> QueueResult<()> {
        let mut conn = self.connection("sorted_add").await?;
        let _: u64 = conn
            .zadd(key, member, score)
            .await
            .map_err(|e| QueueError::store("sorted_add", e))?;
        Ok(())
    }

    async fn sorted_range(&self, key: &str, start: i64, stop: i64) -> QueueResult<Vec<StoreValue>> {
        let mut conn = self.connection("sorted_range").await?;
        let members: Vec<String> = conn
            .zrange(key, start as isize, stop as isize)
            .await
            .map_err(|e| QueueError::store("sorted_range", e))?;
        Ok(members.into_iter().map(StoreValue::Raw).collect())
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> QueueResult<u64> {
        let mut conn = self.connection("sorted_remove").await?;
        conn.zrem(key, member)
            .await
            .map_err(|e| QueueError::store("sorted_remove", e))
    }

    async fn sorted_len(&self, key: &str) -> QueueResult<u64> {
        let mut conn = self.connection("sorted_len").await?;
        conn.zcard(key)
            .await
            .map_err(|e| QueueError::store("sorted_len", e))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> QueueResult<()> {
        let mut conn = self.connection("expire").await?;
        let _: bool = conn
            .expire(key, ttl_seconds as i64)
            .await
            .map_err(|e| QueueError::store("expire", e))?;
        Ok(())
    }
}
