//! Persistence gateway.
//!
//! Owns the single SQLite handle used by the whole process. The handle is
//! opened on first use and cached; later callers get the same pool back
//! without reconnecting. Initialization is guarded by a `OnceCell`, so
//! concurrent first callers wait on one connection attempt instead of racing.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{io, str::FromStr};
use thiserror::Error;
use tokio::{fs, sync::OnceCell};
use tracing::{debug, info};

/// Embedded schema, applied on every fresh connection. Statements are idempotent.
const MIGRATION_SQL: &str = include_str!("../../migrations/0001_init.sql");

/// The in-memory location; the database name is ignored for it.
pub const MEMORY_URI: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database name `{0}` is invalid")]
    InvalidDatabaseName(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The two values required to reach the store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Location root, e.g. `sqlite://./data` or `sqlite::memory:`.
    pub uri: String,
    /// Database name; selects `<root>/<name>.db`.
    pub name: String,
}

impl DatabaseConfig {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_URI, "memory")
    }

    pub fn is_in_memory(&self) -> bool {
        self.uri.trim() == MEMORY_URI
    }

    /// Resolve the SQLx connection URL for this config.
    pub fn database_url(&self) -> Result<String, GatewayError> {
        if self.is_in_memory() {
            return Ok(MEMORY_URI.to_string());
        }

        let name = self.name.trim();
        if name.is_empty()
            || name.contains("..")
            || name
                .bytes()
                .any(|b| b == b'/' || b == b'\\' || b.is_ascii_control())
        {
            return Err(GatewayError::InvalidDatabaseName(self.name.clone()));
        }

        // connection options stay after the file name
        let (root, query) = match self.uri.trim().split_once('?') {
            Some((root, query)) => (root, Some(query)),
            None => (self.uri.trim(), None),
        };
        let mut url = format!("{}/{}.db", root.trim_end_matches('/'), name);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }
        Ok(url)
    }
}

/// Connection handle plus the database it points at.
#[derive(Debug)]
pub struct DatabaseHandle {
    pub pool: SqlitePool,
    pub name: String,
}

pub struct Gateway {
    config: DatabaseConfig,
    handle: OnceCell<DatabaseHandle>,
}

impl Gateway {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    /// Whether the handle has been opened yet.
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }

    /// Connect on first call, reuse the cached handle afterwards.
    pub async fn connect(&self) -> Result<&DatabaseHandle, GatewayError> {
        if let Some(handle) = self.handle.get() {
            debug!(database = %handle.name, "reusing cached database handle");
            return Ok(handle);
        }

        self.handle.get_or_try_init(|| open(&self.config)).await
    }
}

async fn open(config: &DatabaseConfig) -> Result<DatabaseHandle, GatewayError> {
    let url = config.database_url()?;
    info!(database = %config.name, "connecting to {}", url);

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if config.is_in_memory() {
        // every connection to :memory: would be a separate database
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
                info!("created missing directory {:?}", parent);
            }
        }
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;
    run_migrations(&pool).await?;
    info!(database = %config.name, "database connected");

    Ok(DatabaseHandle {
        pool,
        name: config.name.clone(),
    })
}

/// Apply the embedded schema statement by statement.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), GatewayError> {
    let statements = MIGRATION_SQL
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    debug!("running {} migration statements", statements.len());

    for stmt in statements {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    #[test]
    fn database_url_joins_root_and_name() {
        let cfg = DatabaseConfig::new("sqlite://./data/", "gallery");
        assert_eq!(cfg.database_url().unwrap(), "sqlite://./data/gallery.db");
    }

    #[test]
    fn database_url_keeps_query_after_file_name() {
        let cfg = DatabaseConfig::new("sqlite://./data?mode=rwc", "gallery");
        assert_eq!(cfg.database_url().unwrap(), "sqlite://./data/gallery.db?mode=rwc");

        let cfg = DatabaseConfig::new("sqlite://./data/?", "gallery");
        assert_eq!(cfg.database_url().unwrap(), "sqlite://./data/gallery.db");
    }

    #[test]
    fn memory_uri_ignores_name() {
        let cfg = DatabaseConfig::new(MEMORY_URI, "../whatever");
        assert_eq!(cfg.database_url().unwrap(), MEMORY_URI);
    }

    #[test]
    fn rejects_path_like_names() {
        for name in ["", "  ", "../etc", "a/b", "a\\b"] {
            let cfg = DatabaseConfig::new("sqlite://./data", name);
            assert!(
                matches!(cfg.database_url(), Err(GatewayError::InvalidDatabaseName(_))),
                "name {name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn connect_returns_cached_handle() {
        let gateway = Gateway::new(DatabaseConfig::in_memory());
        assert!(!gateway.is_connected());

        let first = gateway.connect().await.unwrap() as *const DatabaseHandle;
        let second = gateway.connect().await.unwrap() as *const DatabaseHandle;

        assert!(gateway.is_connected());
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn concurrent_first_connects_share_one_handle() {
        let gateway = Arc::new(Gateway::new(DatabaseConfig::in_memory()));

        let a = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.connect().await.map(|h| h as *const DatabaseHandle as usize) }
        });
        let b = tokio::spawn({
            let gateway = gateway.clone();
            async move { gateway.connect().await.map(|h| h as *const DatabaseHandle as usize) }
        });

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn connect_applies_schema() {
        let gateway = Gateway::new(DatabaseConfig::in_memory());
        let handle = gateway.connect().await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('images', 'comments') ORDER BY name",
        )
        .fetch_all(&handle.pool)
        .await
        .unwrap();

        assert_eq!(tables, vec!["comments".to_string(), "images".to_string()]);
    }

    #[tokio::test]
    async fn file_database_is_created_under_root() {
        let root = std::env::temp_dir().join(format!("gallery-test-{}", Uuid::new_v4()));
        let cfg = DatabaseConfig::new(format!("sqlite://{}", root.display()), "gallery");

        let gateway = Gateway::new(cfg);
        let handle = gateway.connect().await.unwrap();
        assert_eq!(handle.name, "gallery");
        assert!(root.join("gallery.db").exists());

        handle.pool.close().await;
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_database_accepts_uri_options() {
        let root = std::env::temp_dir().join(format!("gallery-test-{}", Uuid::new_v4()));
        let cfg = DatabaseConfig::new(format!("sqlite://{}?mode=rwc", root.display()), "opts");

        let gateway = Gateway::new(cfg);
        let handle = gateway.connect().await.unwrap();
        assert!(root.join("opts.db").exists());

        handle.pool.close().await;
        let _ = std::fs::remove_dir_all(&root);
    }
}
