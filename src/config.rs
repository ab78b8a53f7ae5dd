use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};

/// Where sessions are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionBackend {
    Postgres,
    Redis,
    Memory,
}

impl FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown SESSION_BACKEND {:?} (postgres, redis, memory)", other),
        }
    }
}

/// Where users are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserBackend {
    Postgres,
    Memory,
}

impl FromStr for UserBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown USER_BACKEND {:?} (postgres, memory)", other),
        }
    }
}

/// How stored credentials are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialKind {
    Plain,
    Argon2,
}

impl FromStr for CredentialKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "argon2" => Ok(Self::Argon2),
            other => anyhow::bail!("unknown CREDENTIAL_SCHEME {:?} (plain, argon2)", other),
        }
    }
}

/// Which status a role denial is reported with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DenialStatus {
    /// 403, distinct from a missing resource.
    #[default]
    Forbidden,
    /// 404, indistinguishable from a missing resource.
    NotFound,
}

impl FromStr for DenialStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forbidden" => Ok(Self::Forbidden),
            "not_found" => Ok(Self::NotFound),
            other => anyhow::bail!("unknown ROLE_DENIAL_STATUS {:?} (forbidden, not_found)", other),
        }
    }
}

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The URL of the PostgreSQL database.
    pub database_url: Option<String>,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// Where sessions are kept.
    pub session_backend: SessionBackend,
    /// Where users are kept.
    pub user_backend: UserBackend,
    /// The deadline applied to every store call.
    pub store_timeout: Duration,
    /// How stored credentials are compared.
    pub credential_scheme: CredentialKind,
    /// Which status a role denial is reported with.
    pub denial_status: DenialStatus,
    /// Origins allowed to make credentialed cross-origin requests.
    pub cors_origins: Vec<String>,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
}

impl Default for Config {
    /// In-memory backends on localhost; what tests and `memory` mode run on.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_url: None,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            session_backend: SessionBackend::Memory,
            user_backend: UserBackend::Memory,
            store_timeout: Duration::from_secs(2),
            credential_scheme: CredentialKind::Plain,
            denial_status: DenialStatus::Forbidden,
            cors_origins: vec!["http://localhost:3000".to_string()],
            secure_cookies: false,
        }
    }
}

fn parsed_or<T: FromStr<Err = anyhow::Error>>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw.parse(),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let session_backend = parsed_or("SESSION_BACKEND", SessionBackend::Postgres)?;
        let user_backend = parsed_or("USER_BACKEND", UserBackend::Postgres)?;

        let database_url = env::var("DATABASE_URL").ok();

        let store_timeout_ms: u64 = env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .context("Invalid STORE_TIMEOUT_MS")?;

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();

        let is_production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            == "production";

        let config = Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            database_url,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_backend,
            user_backend,
            store_timeout: Duration::from_millis(store_timeout_ms),
            credential_scheme: parsed_or("CREDENTIAL_SCHEME", CredentialKind::Plain)?,
            denial_status: parsed_or("ROLE_DENIAL_STATUS", DenialStatus::Forbidden)?,
            cors_origins,
            secure_cookies: is_production,
        };
        config.check_backends()?;
        Ok(config)
    }

    /// Rejects backend combinations that cannot work together.
    ///
    /// Postgres sessions reference the `users` table, so they need postgres
    /// users as well.
    pub fn check_backends(&self) -> Result<()> {
        let needs_postgres = self.session_backend == SessionBackend::Postgres
            || self.user_backend == UserBackend::Postgres;
        if needs_postgres && self.database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres backends");
        }

        if self.session_backend == SessionBackend::Postgres
            && self.user_backend != UserBackend::Postgres
        {
            anyhow::bail!("SESSION_BACKEND=postgres requires USER_BACKEND=postgres");
        }
        Ok(())
    }
}
