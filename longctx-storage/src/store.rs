use async_trait::async_trait;
use longctx_core::{BenchmarkRun, Result, ResultStore, RunId, RunStats, RunSummary, TaskResult};
use longctx_metrics::{run_stats, summarize_run};
use sqlx::SqlitePool;
use std::path::Path;

use crate::repositories::{ResultRepository, RunRepository};
use crate::sqlite;

/// `ResultStore` backed by a single SQLite file.
pub struct SqliteResultStore {
    runs: RunRepository,
    results: ResultRepository,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            runs: RunRepository::new(pool.clone()),
            results: ResultRepository::new(pool),
        }
    }

    /// Open the database at `path`, creating the file and schema if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = sqlite::create_pool(path.as_ref()).await?;
        sqlite::migrate(&pool).await?;
        tracing::debug!("Result store ready at {}", path.as_ref().display());
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn save_run(&self, run: &BenchmarkRun) -> Result<()> {
        self.runs.save(run).await
    }

    async fn save_result(&self, result: &TaskResult) -> Result<()> {
        self.results.insert(result).await
    }

    async fn get_run(&self, run_id: &RunId) -> Result<Option<BenchmarkRun>> {
        self.runs.get_by_id(run_id).await
    }

    async fn get_results(&self, run_id: &RunId) -> Result<Vec<TaskResult>> {
        self.results.list_for_run(run_id).await
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<BenchmarkRun>> {
        self.runs.list_recent(limit).await
    }

    async fn update_run_stats(&self, run_id: &RunId) -> Result<RunStats> {
        let results = self.results.list_for_run(run_id).await?;
        let stats = run_stats(&results);
        self.runs.update_stats(run_id, &stats).await?;
        Ok(stats)
    }

    async fn get_run_summary(&self, run_id: &RunId) -> Result<Option<RunSummary>> {
        let Some(run) = self.runs.get_by_id(run_id).await? else {
            return Ok(None);
        };
        let results = self.results.list_for_run(run_id).await?;
        Ok(Some(summarize_run(&run, &results)))
    }
}
