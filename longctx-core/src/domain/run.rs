use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::RunId;
use crate::error::CoreError;

// ===== Strategy Kind =====

/// Answering strategy applied to every task of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Feed a (possibly truncated) context in one call.
    Truncation,
    /// Chunk, analyze each chunk, synthesize.
    #[serde(alias = "rlm_rs")]
    MapReduce,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Truncation => "truncation",
            StrategyKind::MapReduce => "map_reduce",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "truncation" => Ok(StrategyKind::Truncation),
            "map_reduce" | "map-reduce" | "rlm_rs" => Ok(StrategyKind::MapReduce),
            other => Err(CoreError::Validation(format!("Unknown strategy: {}", other))),
        }
    }
}

// ===== Execution Mode =====

/// Where the answering strategy runs relative to the driver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[serde(alias = "sdk")]
    InProcess,
    #[serde(alias = "hooks")]
    OutOfProcess,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::InProcess => "in_process",
            ExecutionMode::OutOfProcess => "out_of_process",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in_process" | "in-process" | "sdk" => Ok(ExecutionMode::InProcess),
            "out_of_process" | "out-of-process" | "hooks" => Ok(ExecutionMode::OutOfProcess),
            other => Err(CoreError::Validation(format!("Unknown execution mode: {}", other))),
        }
    }
}

// ===== Benchmark Run =====

/// Metadata key for hand-offs whose record disappeared before completion.
pub const META_ABANDONED: &str = "abandoned";
/// Metadata key for hand-offs that hit the completion deadline.
pub const META_TIMED_OUT: &str = "timed_out";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkRun {
    pub id: RunId,
    pub timestamp: DateTime<Utc>,
    pub mode: ExecutionMode,
    pub strategy: StrategyKind,
    pub tasks_total: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub avg_score: f64,
    pub total_latency_ms: f64,
    pub metadata: serde_json::Value,
}

impl BenchmarkRun {
    pub fn new(strategy: StrategyKind, mode: ExecutionMode) -> Self {
        Self {
            id: RunId::generate(),
            timestamp: Utc::now(),
            mode,
            strategy,
            tasks_total: 0,
            tasks_completed: 0,
            tasks_failed: 0,
            avg_score: 0.0,
            total_latency_ms: 0.0,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_id(mut self, id: RunId) -> Self {
        self.id = id;
        self
    }

    pub fn with_tasks_total(mut self, tasks_total: u64) -> Self {
        self.tasks_total = tasks_total;
        self
    }

    /// Set a single metadata entry, turning non-object metadata into an object.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        if !self.metadata.is_object() {
            self.metadata = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = self.metadata.as_object_mut() {
            map.insert(key.into(), value);
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.set_metadata(key, value);
        self
    }

    pub fn apply_stats(&mut self, stats: &RunStats) {
        self.tasks_total = stats.tasks_total;
        self.tasks_completed = stats.tasks_completed;
        self.tasks_failed = stats.tasks_failed;
        self.avg_score = stats.avg_score;
        self.total_latency_ms = stats.total_latency_ms;
    }
}

// ===== Run Stats / Summary / Comparison =====

/// Counters persisted onto a run record once its tasks are done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RunStats {
    pub tasks_total: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub avg_score: f64,
    pub total_latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: RunId,
    pub strategy: StrategyKind,
    pub mode: ExecutionMode,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub total_latency_ms: f64,
    pub avg_latency_ms: f64,
}

impl RunSummary {
    pub fn tasks_total(&self) -> u64 {
        self.tasks_completed + self.tasks_failed
    }
}

/// Side-by-side view of two runs. Deltas are `candidate - baseline`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunComparison {
    pub baseline: RunSummary,
    pub candidate: RunSummary,
    pub avg_score_delta: f64,
    pub min_score_delta: f64,
    pub max_score_delta: f64,
    pub tasks_completed_delta: i64,
    pub tasks_failed_delta: i64,
    pub avg_latency_delta_ms: f64,
    pub total_latency_delta_ms: f64,
    /// Relative change of the average score in percent, when the baseline is non-zero.
    pub improvement_pct: Option<f64>,
}
