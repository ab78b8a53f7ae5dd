use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::{
    error::StoreError,
    models::{
        role::Role,
        user::{NewUser, User},
    },
};

/// Read access to user records, plus the administrative writes the user
/// endpoints need.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by id.
    async fn get(&self, user_id: i32) -> Result<User, StoreError>;

    /// Finds a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Lists every user ordered by id.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Creates a user. A taken email yields [`StoreError::Conflict`].
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Deletes a user by id.
    async fn delete(&self, user_id: i32) -> Result<(), StoreError>;

    /// Releases the backend's connections. Called once on shutdown.
    async fn close(&self) {}
}

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User, StoreError> {
    let role_id: i32 = row
        .try_get("role_id")
        .map_err(|_| StoreError::InvalidRow("role_id".to_string()))?;

    Ok(User {
        id: row
            .try_get("id")
            .map_err(|_| StoreError::InvalidRow("id".to_string()))?,
        email: row
            .try_get("email")
            .map_err(|_| StoreError::InvalidRow("email".to_string()))?,
        credential: row
            .try_get("password")
            .map_err(|_| StoreError::InvalidRow("password".to_string()))?,
        role: Role::try_from(role_id).map_err(|e| StoreError::InvalidRow(e.to_string()))?,
    })
}

/// Users kept in the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: Pool,
}

impl PgUserDirectory {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get(&self, user_id: i32) -> Result<User, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, email, password, role_id
                FROM users
                WHERE id = $1
                "#,
                &[&user_id],
            )
            .await?
            .ok_or(StoreError::NotFound)?;
        row_to_user(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, email, password, role_id
                FROM users
                WHERE email = $1
                "#,
                &[&email],
            )
            .await?
            .ok_or(StoreError::NotFound)?;
        row_to_user(&row)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, email, password, role_id FROM users ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(row_to_user).collect()
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO users (email, password, role_id)
                VALUES ($1, $2, $3)
                RETURNING id, email, password, role_id
                "#,
                &[&user.email, &user.credential, &user.role.id()],
            )
            .await?;
        row_to_user(&row)
    }

    async fn delete(&self, user_id: i32) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM users WHERE id = $1", &[&user_id])
            .await?;

        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn close(&self) {
        self.pool.close();
    }
}
