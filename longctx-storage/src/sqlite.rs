use longctx_core::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Schema for the run and result tables, applied statement by statement.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS runs (
        id TEXT PRIMARY KEY,
        timestamp TEXT NOT NULL,
        mode TEXT NOT NULL,
        strategy TEXT NOT NULL,
        tasks_total INTEGER DEFAULT 0,
        tasks_completed INTEGER DEFAULT 0,
        tasks_failed INTEGER DEFAULT 0,
        avg_score REAL DEFAULT 0.0,
        total_latency_ms REAL DEFAULT 0.0,
        metadata TEXT DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id TEXT NOT NULL,
        task_id TEXT NOT NULL,
        strategy TEXT NOT NULL,
        actual_answer TEXT,
        expected_answer TEXT,
        score REAL NOT NULL,
        latency_ms REAL NOT NULL,
        tokens_used INTEGER DEFAULT 0,
        error TEXT,
        FOREIGN KEY (run_id) REFERENCES runs(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_results_run_id ON results(run_id)",
    "CREATE INDEX IF NOT EXISTS idx_results_task_id ON results(task_id)",
];

/// Configuration for the SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl SqliteConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
        }
    }
}

/// Open (creating if needed) the database at `path` with default settings
pub async fn create_pool(path: impl AsRef<Path>) -> Result<SqlitePool> {
    create_pool_with_config(&SqliteConfig::new(path.as_ref())).await
}

pub async fn create_pool_with_config(config: &SqliteConfig) -> Result<SqlitePool> {
    if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .connect_with(options)
        .await?;

    tracing::debug!(
        "SQLite pool opened at {} (max: {})",
        config.path.display(),
        config.max_connections
    );

    Ok(pool)
}

/// Create tables and indices if they do not exist yet
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("Database schema ready");
    Ok(())
}

/// Health check for database connection
pub async fn health_check(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
