use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::repository::Store;
use crate::database::schema;

/// Errors raised by the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Database unreachable: {0}")]
    Unreachable(#[source] sqlx::Error),

    #[error("Failed to create table {table}: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("User {0} does not exist")]
    UnknownUser(i32),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// PostgreSQL-backed store holding the single shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool, verify the server answers, then ensure the tables exist.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let display_url = redact_url(url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(StoreError::Unreachable)?;

        let store = Self { pool };
        store.ping().await?;
        info!("Database connection established: {}", display_url);

        schema::ensure_tables(&store.pool).await?;
        Ok(store)
    }

    /// Wrap an existing pool without touching the schema
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(StoreError::Unreachable)?;
        Ok(())
    }

    async fn close(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close().await;
        info!("Closed database pool");
    }
}

/// Connection string with the password masked, safe for logs
fn redact_url(raw: &str) -> Result<String, StoreError> {
    let mut url = url::Url::parse(raw).map_err(|_| StoreError::InvalidDatabaseUrl)?;
    if url.password().is_some() {
        url.set_password(Some("***"))
            .map_err(|_| StoreError::InvalidDatabaseUrl)?;
    }
    Ok(url.to_string())
}
