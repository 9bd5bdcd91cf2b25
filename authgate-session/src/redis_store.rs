use crate::{AuthError, Session, SessionStore};
use async_trait::async_trait;
use redis::AsyncCommands;

/// A session store backed by Redis.
///
/// Sessions are stored as JSON strings under `{prefix}:session:{id}` and expire
/// through Redis' own TTL (`SET ... EX`).
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
}

impl RedisStore {
    /// Create a store for the Redis instance at `url`.
    ///
    /// No connection is made until the first command.
    pub fn new(url: &str, prefix: String) -> Result<Self, AuthError> {
        let client = redis::Client::open(url)
            .map_err(|e| AuthError::Config(format!("Invalid Redis URL: {e}")))?;
        Ok(Self { client, prefix })
    }

    fn key(&self, id: &str) -> String {
        format!("{}:session:{}", self.prefix, id)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn put(
        &self,
        id: &str,
        session: &Session,
        ttl: chrono::Duration,
    ) -> Result<(), AuthError> {
        let value = serde_json::to_string(session)
            .map_err(|e| AuthError::SessionPersist(format!("Serialization error: {e}")))?;
        // Redis rejects EX 0.
        let seconds = ttl.num_seconds().max(1) as u64;

        let mut conn = self
            .connection()
            .await
            .map_err(|e| AuthError::SessionPersist(format!("Redis connection error: {e}")))?;
        conn.set_ex::<_, _, ()>(self.key(id), value, seconds)
            .await
            .map_err(|e| AuthError::SessionPersist(format!("Redis SET error: {e}")))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let mut conn = self
            .connection()
            .await
            .map_err(|e| AuthError::Session(format!("Redis connection error: {e}")))?;
        let value: Option<String> = conn
            .get(self.key(id))
            .await
            .map_err(|e| AuthError::Session(format!("Redis GET error: {e}")))?;

        match value {
            Some(json) => {
                let session = serde_json::from_str(&json)
                    .map_err(|e| AuthError::Session(format!("Deserialization error: {e}")))?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AuthError> {
        let mut conn = self
            .connection()
            .await
            .map_err(|e| AuthError::Session(format!("Redis connection error: {e}")))?;
        conn.del::<_, ()>(self.key(id))
            .await
            .map_err(|e| AuthError::Session(format!("Redis DEL error: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let store = RedisStore::new("redis://127.0.0.1/", "authgate".into()).unwrap();
        assert_eq!(store.key("abc"), "authgate:session:abc");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let result = RedisStore::new("not a url", "authgate".into());
        assert!(matches!(result, Err(AuthError::Config(_))));
    }
}
