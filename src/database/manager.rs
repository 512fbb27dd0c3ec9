use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// SQLSTATE codes surfaced as typed errors
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors from the relational store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
    Conflict { constraint: Option<String> },

    #[error("Foreign key constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
    ForeignKey { constraint: Option<String> },

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        let (code, constraint) = match &err {
            sqlx::Error::RowNotFound => {
                return DatabaseError::NotFound("Record not found".to_string());
            }
            sqlx::Error::Database(db_err) => (
                db_err.code().map(|code| code.into_owned()),
                db_err.constraint().map(str::to_string),
            ),
            _ => (None, None),
        };

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => DatabaseError::Conflict { constraint },
            Some(FOREIGN_KEY_VIOLATION) => DatabaseError::ForeignKey { constraint },
            _ => DatabaseError::Sqlx(err),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

/// Explicit handle on the connection pool, created at startup and passed to
/// every store and service that needs it
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using the configured URL and pool settings
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = Self::connect_options(config)?;
        let pool = Self::pool_options(config).connect_with(options).await?;

        info!(
            "Connected to database {} (max_connections={})",
            Self::redacted_url(config).unwrap_or_default(),
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Build a pool that only opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = Self::connect_options(config)?;
        let pool = Self::pool_options(config).connect_lazy_with(options);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded SQL migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let mut options: PgConnectOptions = url.parse().map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if config.statement_timeout_ms > 0 {
            let timeout = config.statement_timeout_ms.to_string();
            options = options.options([("statement_timeout", timeout.as_str())]);
        }
        Ok(options)
    }

    /// Connection URL with the password stripped, for logging
    fn redacted_url(config: &DatabaseConfig) -> Option<String> {
        let mut url = url::Url::parse(config.url.as_deref()?).ok()?;
        if url.password().is_some() {
            url.set_password(Some("****")).ok()?;
        }
        Some(url.into())
    }
}
