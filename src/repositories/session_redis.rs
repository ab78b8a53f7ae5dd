use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::{error::StoreError, models::session::Session, repositories::session::SessionStore};

fn session_key(token: &str) -> String {
    format!("session:{}", token)
}

fn user_sessions_key(user_id: i32) -> String {
    format!("user_sessions:{}", user_id)
}

/// Sessions kept as `session:<token>` keys holding the user id.
///
/// Each user's tokens are also indexed in a `user_sessions:<id>` set so they
/// can be removed together. Keys carry no TTL; a session lives until it is
/// deleted.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn add(&self, token: &str, user_id: i32) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let created: bool = conn.set_nx(session_key(token), user_id).await?;

        if !created {
            return Err(StoreError::Conflict);
        }
        let _: i64 = conn.sadd(user_sessions_key(user_id), token).await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, StoreError> {
        let mut conn = self.redis.clone();
        let user_id: Option<i32> = conn.get(session_key(token)).await?;

        user_id
            .map(|user_id| Session {
                token: token.to_string(),
                user_id,
            })
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let owner: Option<i32> = conn.get(session_key(token)).await?;
        let removed: i64 = conn.del(session_key(token)).await?;

        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        if let Some(user_id) = owner {
            let _: i64 = conn.srem(user_sessions_key(user_id), token).await?;
        }
        Ok(())
    }

    async fn delete_for_user(&self, user_id: i32) -> Result<u64, StoreError> {
        let mut conn = self.redis.clone();
        let tokens: Vec<String> = conn.smembers(user_sessions_key(user_id)).await?;

        let removed: i64 = if tokens.is_empty() {
            0
        } else {
            let keys: Vec<String> = tokens.iter().map(|t| session_key(t)).collect();
            conn.del(keys).await?
        };
        let _: i64 = conn.del(user_sessions_key(user_id)).await?;

        Ok(removed.max(0) as u64)
    }
}
