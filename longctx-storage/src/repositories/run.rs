use chrono::{DateTime, Utc};
use longctx_core::{BenchmarkRun, CoreError, Result, RunId, RunStats};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const RUN_COLUMNS: &str = "id, timestamp, mode, strategy, tasks_total, tasks_completed, \
                           tasks_failed, avg_score, total_latency_ms, metadata";

pub struct RunRepository {
    pool: SqlitePool,
}

impl RunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a run, or replace every column of an existing one.
    ///
    /// Upserts in place so results keep pointing at the same row.
    pub async fn save(&self, run: &BenchmarkRun) -> Result<()> {
        let metadata = serde_json::to_string(&run.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO runs (
                id, timestamp, mode, strategy, tasks_total, tasks_completed,
                tasks_failed, avg_score, total_latency_ms, metadata
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                timestamp = excluded.timestamp,
                mode = excluded.mode,
                strategy = excluded.strategy,
                tasks_total = excluded.tasks_total,
                tasks_completed = excluded.tasks_completed,
                tasks_failed = excluded.tasks_failed,
                avg_score = excluded.avg_score,
                total_latency_ms = excluded.total_latency_ms,
                metadata = excluded.metadata
            "#,
        )
        .bind(run.id.as_ref())
        .bind(run.timestamp)
        .bind(run.mode.as_str())
        .bind(run.strategy.as_str())
        .bind(run.tasks_total as i64)
        .bind(run.tasks_completed as i64)
        .bind(run.tasks_failed as i64)
        .bind(run.avg_score)
        .bind(run.total_latency_ms)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &RunId) -> Result<Option<BenchmarkRun>> {
        let row = sqlx::query(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))
            .bind(id.as_ref())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_run).transpose()
    }

    /// Most recent runs first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<BenchmarkRun>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM runs ORDER BY timestamp DESC LIMIT ?1",
            RUN_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_run).collect()
    }

    pub async fn update_stats(&self, id: &RunId, stats: &RunStats) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE runs
            SET tasks_total = ?2, tasks_completed = ?3, tasks_failed = ?4,
                avg_score = ?5, total_latency_ms = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id.as_ref())
        .bind(stats.tasks_total as i64)
        .bind(stats.tasks_completed as i64)
        .bind(stats.tasks_failed as i64)
        .bind(stats.avg_score)
        .bind(stats.total_latency_ms)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Run {} not found", id)));
        }
        Ok(())
    }
}

fn row_to_run(row: SqliteRow) -> Result<BenchmarkRun> {
    let id: String = row.try_get("id")?;
    let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
    let mode: String = row.try_get("mode")?;
    let strategy: String = row.try_get("strategy")?;
    let tasks_total: i64 = row.try_get("tasks_total")?;
    let tasks_completed: i64 = row.try_get("tasks_completed")?;
    let tasks_failed: i64 = row.try_get("tasks_failed")?;
    let avg_score: Option<f64> = row.try_get("avg_score")?;
    let total_latency_ms: Option<f64> = row.try_get("total_latency_ms")?;
    let metadata: Option<String> = row.try_get("metadata")?;

    let metadata = metadata
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    Ok(BenchmarkRun {
        id: RunId::from(id),
        timestamp,
        mode: mode.parse()?,
        strategy: strategy.parse()?,
        tasks_total: tasks_total.max(0) as u64,
        tasks_completed: tasks_completed.max(0) as u64,
        tasks_failed: tasks_failed.max(0) as u64,
        avg_score: avg_score.unwrap_or(0.0),
        total_latency_ms: total_latency_ms.unwrap_or(0.0),
        metadata,
    })
}
