//! Process-wide PostgreSQL handle.
//!
//! A [`Database`] is built once by `main`, lent to the repositories as a pool
//! clone and closed when the server stops. The pool synchronizes itself, so
//! nothing here takes a lock.

use crate::setup::{env_param, env_param_or, VarError};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    Connection, PgPool,
};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to connect to the database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("The database did not answer the ping: {0}")]
    Ping(#[source] sqlx::Error),
}

/// Connection parameters for the `users` database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: PgSslMode,
    /// Upper bound on how long `init` waits for the first connection.
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, VarError> {
        Ok(Self {
            host: env_param_or("APP_DB_HOST", "localhost".to_owned())?,
            port: env_param_or("APP_DB_PORT", 5432_u16)?,
            user: env_param_or("APP_DB_USER", "postgres".to_owned())?,
            password: env_param("APP_DB_PASSWORD")?,
            database: env_param_or("APP_DB_NAME", "userdb".to_owned())?,
            ssl_mode: env_param_or("APP_DB_SSLMODE", PgSslMode::Disable)?,
            connect_timeout: Duration::from_secs(env_param_or(
                "APP_DB_CONNECT_TIMEOUT",
                5_u64,
            )?),
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(self.ssl_mode)
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the pool and pings one connection. Startup must abort on error.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(config.connect_timeout)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| {
                tracing::error!(
                    error = e.to_string(),
                    host = %config.host,
                    port = config.port,
                    database = %config.database,
                    "Failed to connect to the database"
                );
                ConnectionError::Connect(e)
            })?;

        let db = Self { pool };
        db.ping().await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "Database connection established"
        );

        Ok(db)
    }

    /// Wraps an already opened pool, skipping the liveness check.
    #[cfg(test)]
    #[inline]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<(), ConnectionError> {
        let mut conn = self.pool.acquire().await.map_err(ConnectionError::Connect)?;

        conn.ping().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "Database ping failed");
            ConnectionError::Ping(e)
        })
    }

    #[inline]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            host: "db.internal".into(),
            port: 5433,
            user: "users_app".into(),
            password: "hunter2".into(),
            database: "userdb".into(),
            ssl_mode: PgSslMode::Disable,
            connect_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_connect_options() {
        let opts = config().connect_options();

        assert_eq!(opts.get_host(), "db.internal");
        assert_eq!(opts.get_port(), 5433);
        assert_eq!(opts.get_username(), "users_app");
        assert_eq!(opts.get_database(), Some("userdb"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", config());

        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("db.internal"));
    }

    #[tokio::test]
    async fn test_init_fails_fast_when_unreachable() {
        let config = DatabaseConfig {
            host: "127.0.0.1".into(),
            port: 1,
            connect_timeout: Duration::from_secs(1),
            ..config()
        };

        let res = tokio::time::timeout(Duration::from_secs(5), Database::init(&config))
            .await
            .expect("init outlived its connect timeout");

        assert!(matches!(res, Err(ConnectionError::Connect(_))));
    }
}
