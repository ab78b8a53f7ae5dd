use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{error::StoreError, models::session::Session};

/// Durable mapping from session token to user id.
///
/// Each call is its own unit of work; no call spans more than one statement
/// or command, so a caller that looks up and then mutates must tolerate the
/// window between the two calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts a new session. A token that already exists yields
    /// [`StoreError::Conflict`].
    async fn add(&self, token: &str, user_id: i32) -> Result<(), StoreError>;

    /// Looks up a session by token.
    async fn get(&self, token: &str) -> Result<Session, StoreError>;

    /// Removes a session by token.
    async fn delete(&self, token: &str) -> Result<(), StoreError>;

    /// Removes every session of `user_id`, returning how many went.
    async fn delete_for_user(&self, user_id: i32) -> Result<u64, StoreError>;

    /// Releases the backend's connections. Called once on shutdown.
    async fn close(&self) {}
}

/// Runs a store call under `deadline`.
///
/// When the deadline elapses the call's future is dropped, which aborts the
/// in-flight statement, and [`StoreError::Timeout`] is returned.
pub async fn bounded<T, E, F>(deadline: Duration, call: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<StoreError>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("⏱️ Store call abandoned after {:?}", deadline);
            Err(StoreError::Timeout(deadline).into())
        }
    }
}

/// Sessions kept in the `sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: Pool,
}

impl PgSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn add(&self, token: &str, user_id: i32) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO sessions (id, user_id)
                VALUES ($1, $2)
                "#,
                &[&token, &user_id],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, user_id
                FROM sessions
                WHERE id = $1
                "#,
                &[&token],
            )
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(Session {
            token: row
                .try_get("id")
                .map_err(|_| StoreError::InvalidRow("id".to_string()))?,
            user_id: row
                .try_get("user_id")
                .map_err(|_| StoreError::InvalidRow("user_id".to_string()))?,
        })
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM sessions WHERE id = $1", &[&token])
            .await?;

        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_for_user(&self, user_id: i32) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM sessions WHERE user_id = $1", &[&user_id])
            .await?;
        Ok(removed)
    }

    async fn close(&self) {
        self.pool.close();
    }
}
