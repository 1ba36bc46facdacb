use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{BenchmarkRun, RunId, RunStats, RunSummary, Task, TaskFilter, TaskResult};
use crate::error::Result;

#[async_trait]
pub trait MetricCalculator {
    type Input;
    type Output;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output>;
}

// ===== Answering Engine =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Envelope with a `result` field and `usage.output_tokens`.
    Json,
    /// Bare text.
    Text,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRequest {
    pub model: String,
    pub prompt: String,
    pub format: ResponseFormat,
    pub timeout: Duration,
}

impl AnswerRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            format: ResponseFormat::Json,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Black-box text-generation capability.
///
/// Returns the raw output on success. Non-zero exits surface as
/// `CoreError::ExternalCall` and deadline overruns as `CoreError::Timeout`.
#[async_trait]
pub trait AnsweringEngine: Send + Sync {
    async fn answer(&self, request: &AnswerRequest) -> Result<String>;
}

// ===== Chunker =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub mode: String,
    pub target_size: usize,
}

/// Splits a context into ordered, non-empty chunks.
#[async_trait]
pub trait Chunker: Send + Sync {
    async fn split(&self, context: &str, spec: &ChunkSpec) -> Result<Vec<String>>;
}

// ===== Agent Launcher =====

/// Starts one external agent session that will pick up the pending task.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    async fn launch(&self, prompt: &str) -> Result<()>;
}

// ===== Task Provider =====

#[async_trait]
pub trait TaskProvider: Send + Sync {
    async fn load_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
}

// ===== Result Store =====

/// Durable home for runs and their per-task results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save_run(&self, run: &BenchmarkRun) -> Result<()>;

    async fn save_result(&self, result: &TaskResult) -> Result<()>;

    async fn get_run(&self, run_id: &RunId) -> Result<Option<BenchmarkRun>>;

    /// Results in insertion order.
    async fn get_results(&self, run_id: &RunId) -> Result<Vec<TaskResult>>;

    async fn list_runs(&self, limit: usize) -> Result<Vec<BenchmarkRun>>;

    /// Recompute the run's counters from its stored results.
    async fn update_run_stats(&self, run_id: &RunId) -> Result<RunStats>;

    async fn get_run_summary(&self, run_id: &RunId) -> Result<Option<RunSummary>>;
}
