use crate::crypto::token::generate_session_token;
use crate::error::{AppError, Result, StoreError};
use crate::repositories::session::bounded;
use crate::state::AppState;

/// How many fresh tokens login tries before giving up on collisions.
pub const MAX_TOKEN_ATTEMPTS: usize = 3;

/// Authenticates a user and opens a session.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `email` - The user's email address.
/// * `password` - The supplied credential.
///
/// # Returns
///
/// The new session's token. Only returned once the session is stored.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<String> {
    tracing::debug!("🔐 Authenticating user: {}", email);
    let deadline = state.config.store_timeout;

    let user = bounded(deadline, state.users.find_by_email(email))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::Validation("User not found".to_string()),
            other => other.into(),
        })?;

    if !state.credentials.verify(&user.credential, password) {
        return Err(AppError::Authentication("invalid password".to_string()));
    }

    let token = open_session(state, user.id).await?;

    tracing::info!("✅ User by email {} logged in", user.email);
    Ok(token)
}

/// Stores a session for `user_id` under a fresh token.
///
/// A token collision regenerates the token, up to [`MAX_TOKEN_ATTEMPTS`]
/// times. Every other store failure is returned as is.
async fn open_session(state: &AppState, user_id: i32) -> Result<String> {
    let deadline = state.config.store_timeout;

    for attempt in 1..=MAX_TOKEN_ATTEMPTS {
        let token = generate_session_token();

        match bounded(deadline, state.sessions.add(&token, user_id)).await {
            Ok(()) => {
                tracing::debug!("🔑 Session stored for user {}", user_id);
                return Ok(token);
            }
            Err(StoreError::Conflict) => {
                tracing::warn!(
                    "🔁 Session token collision (attempt {}/{})",
                    attempt,
                    MAX_TOKEN_ATTEMPTS
                );
            }
            Err(e) => {
                tracing::error!("❌ Failed to store session: {}", e);
                return Err(e.into());
            }
        }
    }

    Err(AppError::Internal(format!(
        "no unique session token after {} attempts",
        MAX_TOKEN_ATTEMPTS
    )))
}

/// Ends the session identified by `token`.
///
/// Looks the session up first so an unknown token is reported as not found,
/// then deletes it. A delete that finds nothing (the session vanished between
/// the two calls) is also not found.
pub async fn logout(state: &AppState, token: &str) -> Result<()> {
    let deadline = state.config.store_timeout;

    let session = bounded(deadline, state.sessions.get(token))
        .await
        .map_err(session_not_found)?;

    bounded(deadline, state.sessions.delete(token))
        .await
        .map_err(session_not_found)?;

    tracing::info!("👋 Session of user {} was deleted", session.user_id);
    Ok(())
}

/// Deletes a session without looking it up first.
pub async fn revoke(state: &AppState, token: &str) -> Result<()> {
    bounded(state.config.store_timeout, state.sessions.delete(token))
        .await
        .map_err(session_not_found)?;

    tracing::info!("🗑️ Session revoked by an administrator");
    Ok(())
}

fn session_not_found(e: StoreError) -> AppError {
    match e {
        StoreError::NotFound => AppError::NotFound("Session not found".to_string()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{
        config::Config,
        crypto::credentials::PlainCredentials,
        models::{role::Role, session::Session, user::NewUser},
        repositories::{
            memory::{MemorySessionStore, MemoryUserDirectory},
            session::SessionStore,
            user::UserDirectory,
        },
    };

    async fn seed(users: &MemoryUserDirectory) -> i32 {
        users
            .create(NewUser {
                email: "a@x.com".to_string(),
                credential: "pw1".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_login_stores_session_for_user() {
        let state = AppState::in_memory(Config::default());
        let user = state
            .users
            .create(NewUser {
                email: "a@x.com".to_string(),
                credential: "pw1".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap();

        let token = login(&state, "a@x.com", "pw1").await.unwrap();

        let session = state.sessions.get(&token).await.unwrap();
        assert_eq!(session.user_id, user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_creates_no_session() {
        let sessions = Arc::new(MemorySessionStore::new());
        let users = Arc::new(MemoryUserDirectory::new());
        seed(&users).await;
        let state = AppState::from_parts(
            Config::default(),
            sessions.clone(),
            users,
            Arc::new(PlainCredentials),
        );

        for wrong in ["pw2", "PW1", "", "pw1pw1"] {
            let err = login(&state, "a@x.com", wrong).await.unwrap_err();
            assert!(matches!(err, AppError::Authentication(_)), "{wrong}");
        }
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_email_is_a_validation_error() {
        let state = AppState::in_memory(Config::default());
        let err = login(&state, "ghost@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    /// Reports a collision for the first `collisions` inserts.
    struct CollidingStore {
        inner: MemorySessionStore,
        collisions: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for CollidingStore {
        async fn add(&self, token: &str, user_id: i32) -> std::result::Result<(), StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(StoreError::Conflict);
            }
            self.inner.add(token, user_id).await
        }

        async fn get(&self, token: &str) -> std::result::Result<Session, StoreError> {
            self.inner.get(token).await
        }

        async fn delete(&self, token: &str) -> std::result::Result<(), StoreError> {
            self.inner.delete(token).await
        }

        async fn delete_for_user(&self, user_id: i32) -> std::result::Result<u64, StoreError> {
            self.inner.delete_for_user(user_id).await
        }
    }

    async fn colliding_state(collisions: usize) -> (AppState, Arc<CollidingStore>) {
        let store = Arc::new(CollidingStore {
            inner: MemorySessionStore::new(),
            collisions,
            calls: AtomicUsize::new(0),
        });
        let users = Arc::new(MemoryUserDirectory::new());
        seed(&users).await;
        let state = AppState::from_parts(
            Config::default(),
            store.clone(),
            users,
            Arc::new(PlainCredentials),
        );
        (state, store)
    }

    #[tokio::test]
    async fn test_login_regenerates_token_on_collision() {
        let (state, store) = colliding_state(2).await;

        let token = login(&state, "a@x.com", "pw1").await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert!(store.inner.get(&token).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_surfaces_exhausted_collisions() {
        let (state, store) = colliding_state(MAX_TOKEN_ATTEMPTS).await;

        let err = login(&state, "a@x.com", "pw1").await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), MAX_TOKEN_ATTEMPTS);
        assert!(store.inner.is_empty().await);
    }

    /// Fails every insert.
    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn add(&self, _: &str, _: i32) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }

        async fn get(&self, _: &str) -> std::result::Result<Session, StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }

        async fn delete(&self, _: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }

        async fn delete_for_user(&self, _: i32) -> std::result::Result<u64, StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_session_insert_failure_is_surfaced() {
        let users = Arc::new(MemoryUserDirectory::new());
        seed(&users).await;
        let state = AppState::from_parts(
            Config::default(),
            Arc::new(BrokenStore),
            users,
            Arc::new(PlainCredentials),
        );

        let err = login(&state, "a@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Backend(_))));

        let err = logout(&state, "anything").await.unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_logout_then_logout_again() {
        let state = AppState::in_memory(Config::default());
        seed_state(&state).await;
        let token = login(&state, "a@x.com", "pw1").await.unwrap();

        logout(&state, &token).await.unwrap();
        assert!(matches!(
            state.sessions.get(&token).await,
            Err(StoreError::NotFound)
        ));

        let err = logout(&state, &token).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_revoke_unknown_session() {
        let state = AppState::in_memory(Config::default());
        assert!(matches!(
            revoke(&state, "missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    async fn seed_state(state: &AppState) {
        state
            .users
            .create(NewUser {
                email: "a@x.com".to_string(),
                credential: "pw1".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap();
    }
}
