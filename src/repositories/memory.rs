//! In-process backends for local development and tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::StoreError,
    models::{
        session::Session,
        user::{NewUser, User},
    },
    repositories::{session::SessionStore, user::UserDirectory},
};

/// Sessions held in a `HashMap`.
///
/// Every mutation happens under one lock acquisition, so a cancelled call
/// either wrote its session completely or not at all.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, i32>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn add(&self, token: &str, user_id: i32) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(token) {
            return Err(StoreError::Conflict);
        }
        sessions.insert(token.to_string(), user_id);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, StoreError> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(token)
            .map(|user_id| Session {
                token: token.to_string(),
                user_id: *user_id,
            })
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(token).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn delete_for_user(&self, user_id: i32) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, owner| *owner != user_id);
        Ok((before - sessions.len()) as u64)
    }
}

#[derive(Default)]
struct UserTable {
    next_id: i32,
    rows: BTreeMap<i32, User>,
}

/// Users held in a `BTreeMap` keyed by id. Ids start at 1.
#[derive(Default)]
pub struct MemoryUserDirectory {
    table: Mutex<UserTable>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn get(&self, user_id: i32) -> Result<User, StoreError> {
        let table = self.table.lock().await;
        table.rows.get(&user_id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let table = self.table.lock().await;
        table
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.lock().await;
        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict);
        }

        table.next_id += 1;
        let created = User {
            id: table.next_id,
            email: user.email,
            credential: user.credential,
            role: user.role,
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete(&self, user_id: i32) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        table.rows.remove(&user_id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{models::role::Role, repositories::session::bounded};

    #[tokio::test]
    async fn test_add_get_delete_round_trip() {
        let store = MemorySessionStore::new();

        store.add("tokenA", 7).await.unwrap();
        let session = store.get("tokenA").await.unwrap();
        assert_eq!(
            session,
            Session {
                token: "tokenA".to_string(),
                user_id: 7
            }
        );

        store.delete("tokenA").await.unwrap();
        assert!(matches!(store.get("tokenA").await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete("tokenA").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_duplicate_token_is_a_conflict() {
        let store = MemorySessionStore::new();
        store.add("same", 1).await.unwrap();

        assert!(matches!(store.add("same", 2).await, Err(StoreError::Conflict)));
        assert_eq!(store.get("same").await.unwrap().user_id, 1);
    }

    #[tokio::test]
    async fn test_delete_for_user_leaves_other_users_alone() {
        let store = MemorySessionStore::new();
        store.add("a1", 1).await.unwrap();
        store.add("a2", 1).await.unwrap();
        store.add("b1", 2).await.unwrap();

        assert_eq!(store.delete_for_user(1).await.unwrap(), 2);
        assert!(matches!(store.get("a1").await, Err(StoreError::NotFound)));
        assert!(matches!(store.get("a2").await, Err(StoreError::NotFound)));
        assert_eq!(store.get("b1").await.unwrap().user_id, 2);

        assert_eq!(store.delete_for_user(1).await.unwrap(), 0);
        assert_eq!(store.len().await, 1);
    }

    /// A store whose writes land only after a fixed delay.
    struct SlowStore {
        inner: MemorySessionStore,
        delay: Duration,
    }

    #[async_trait]
    impl SessionStore for SlowStore {
        async fn add(&self, token: &str, user_id: i32) -> Result<(), StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.add(token, user_id).await
        }

        async fn get(&self, token: &str) -> Result<Session, StoreError> {
            self.inner.get(token).await
        }

        async fn delete(&self, token: &str) -> Result<(), StoreError> {
            self.inner.delete(token).await
        }

        async fn delete_for_user(&self, user_id: i32) -> Result<u64, StoreError> {
            self.inner.delete_for_user(user_id).await
        }
    }

    #[tokio::test]
    async fn test_deadline_leaves_no_partial_session() {
        let store = SlowStore {
            inner: MemorySessionStore::new(),
            delay: Duration::from_millis(500),
        };

        let result = bounded(Duration::from_millis(20), store.add("late", 1)).await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));

        // Give the abandoned write every chance to have landed.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(matches!(store.get("late").await, Err(StoreError::NotFound)));
        assert!(store.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_bounded_passes_through_fast_calls() {
        let store = MemorySessionStore::new();
        bounded(Duration::from_secs(2), store.add("quick", 3))
            .await
            .unwrap();
        let session: Session = bounded(Duration::from_secs(2), store.get("quick"))
            .await
            .unwrap();
        assert_eq!(session.user_id, 3);
    }

    #[tokio::test]
    async fn test_user_directory_lookup_and_uniqueness() {
        let users = MemoryUserDirectory::new();
        let a = users
            .create(NewUser {
                email: "a@x.com".to_string(),
                credential: "pw1".to_string(),
                role: Role::Customer,
            })
            .await
            .unwrap();
        assert_eq!(a.id, 1);

        assert_eq!(users.get(a.id).await.unwrap().email, "a@x.com");
        assert_eq!(users.find_by_email("a@x.com").await.unwrap().id, a.id);
        assert!(matches!(users.find_by_email("b@x.com").await, Err(StoreError::NotFound)));

        let dup = users
            .create(NewUser {
                email: "a@x.com".to_string(),
                credential: "other".to_string(),
                role: Role::Admin,
            })
            .await;
        assert!(matches!(dup, Err(StoreError::Conflict)));

        users.delete(a.id).await.unwrap();
        assert!(matches!(users.get(a.id).await, Err(StoreError::NotFound)));
        assert!(users.list().await.unwrap().is_empty());
    }
}
