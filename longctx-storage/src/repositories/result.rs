use longctx_core::{Result, RunId, StrategyKind, TaskResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub struct ResultRepository {
    pool: SqlitePool,
}

impl ResultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, result: &TaskResult) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO results (
                run_id, task_id, strategy, actual_answer, expected_answer,
                score, latency_ms, tokens_used, error
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(result.run_id().as_ref())
        .bind(result.task_id())
        .bind(result.strategy().as_str())
        .bind(result.actual_answer())
        .bind(result.expected_answer())
        .bind(result.score())
        .bind(result.latency_ms())
        .bind(result.tokens_used() as i64)
        .bind(result.error())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All results of a run in insertion order.
    pub async fn list_for_run(&self, run_id: &RunId) -> Result<Vec<TaskResult>> {
        let rows = sqlx::query(
            r#"
            SELECT run_id, task_id, strategy, actual_answer, expected_answer,
                   score, latency_ms, tokens_used, error
            FROM results
            WHERE run_id = ?1
            ORDER BY id
            "#,
        )
        .bind(run_id.as_ref())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_result).collect()
    }
}

fn row_to_result(row: SqliteRow) -> Result<TaskResult> {
    let run_id: String = row.try_get("run_id")?;
    let task_id: String = row.try_get("task_id")?;
    let strategy: String = row.try_get("strategy")?;
    let actual_answer: Option<String> = row.try_get("actual_answer")?;
    let expected_answer: Option<String> = row.try_get("expected_answer")?;
    let score: f64 = row.try_get("score")?;
    let latency_ms: f64 = row.try_get("latency_ms")?;
    let tokens_used: Option<i64> = row.try_get("tokens_used")?;
    let error: Option<String> = row.try_get("error")?;

    let run_id = RunId::from(run_id);
    let strategy: StrategyKind = strategy.parse()?;
    let expected_answer = expected_answer.unwrap_or_default();

    let result = match error {
        Some(error) => TaskResult::failed(task_id, run_id, strategy, expected_answer, error),
        None => TaskResult::scored(
            task_id,
            run_id,
            strategy,
            expected_answer,
            actual_answer.unwrap_or_default(),
            score,
        ),
    };

    Ok(result
        .with_latency_ms(latency_ms)
        .with_tokens_used(tokens_used.unwrap_or(0).max(0) as u64))
}
