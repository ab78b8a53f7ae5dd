use std::sync::Arc;

use anyhow::Context;
use redis::aio::ConnectionManager;

use crate::config::{Config, CredentialKind, SessionBackend, UserBackend};
use crate::crypto::credentials::{Argon2Credentials, CredentialScheme, PlainCredentials};
use crate::repositories::{
    memory::{MemorySessionStore, MemoryUserDirectory},
    session::{PgSessionStore, SessionStore},
    session_redis::RedisSessionStore,
    user::{PgUserDirectory, UserDirectory},
};

fn credential_scheme(kind: CredentialKind) -> Arc<dyn CredentialScheme> {
    match kind {
        CredentialKind::Plain => Arc::new(PlainCredentials),
        CredentialKind::Argon2 => Arc::new(Argon2Credentials),
    }
}

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// Where sessions live.
    pub sessions: Arc<dyn SessionStore>,
    /// Where users live.
    pub users: Arc<dyn UserDirectory>,
    /// How credentials are checked and stored.
    pub credentials: Arc<dyn CredentialScheme>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState`, connecting to whichever backends `config`
    /// selects.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        config.check_backends()?;

        let pool = match &config.database_url {
            Some(url)
                if config.session_backend == SessionBackend::Postgres
                    || config.user_backend == UserBackend::Postgres =>
            {
                let pool = crate::db::create_pool(url, config.store_timeout)?;
                crate::db::ensure_schema(&pool).await?;
                tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");
                Some(pool)
            }
            _ => None,
        };

        let sessions: Arc<dyn SessionStore> = match config.session_backend {
            SessionBackend::Postgres => {
                let pool = pool.clone().context("postgres sessions need DATABASE_URL")?;
                Arc::new(PgSessionStore::new(pool))
            }
            SessionBackend::Redis => {
                let redis_client = redis::Client::open(config.redis_url.as_str())?;
                let redis = ConnectionManager::new(redis_client).await?;
                tracing::info!("✅ Redis Connection Manager initialized (pooled)");
                Arc::new(RedisSessionStore::new(redis))
            }
            SessionBackend::Memory => {
                tracing::warn!("⚠️ Sessions are kept in memory and vanish on restart");
                Arc::new(MemorySessionStore::new())
            }
        };

        let users: Arc<dyn UserDirectory> = match config.user_backend {
            UserBackend::Postgres => {
                let pool = pool.context("postgres users need DATABASE_URL")?;
                Arc::new(PgUserDirectory::new(pool))
            }
            UserBackend::Memory => {
                tracing::warn!("⚠️ Users are kept in memory and vanish on restart");
                Arc::new(MemoryUserDirectory::new())
            }
        };

        let credentials = credential_scheme(config.credential_scheme);
        tracing::info!("✅ Credential scheme: {:?}", config.credential_scheme);

        Ok(Self::from_parts(config.clone(), sessions, users, credentials))
    }

    /// A state backed by fresh in-memory stores, ignoring the configured
    /// backends.
    pub fn in_memory(config: Config) -> Self {
        let credentials = credential_scheme(config.credential_scheme);
        Self::from_parts(
            config,
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryUserDirectory::new()),
            credentials,
        )
    }

    /// Assembles a state from already-built components.
    pub fn from_parts(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        credentials: Arc<dyn CredentialScheme>,
    ) -> Self {
        Self {
            sessions,
            users,
            credentials,
            config,
        }
    }

    /// Closes the backends' connections.
    pub async fn shutdown(&self) {
        self.sessions.close().await;
        self.users.close().await;
        tracing::info!("✅ Stores closed");
    }
}
