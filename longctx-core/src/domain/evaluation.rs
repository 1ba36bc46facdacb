use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::run::StrategyKind;

// ===== Task Result =====

/// Outcome of one task under one strategy within one run.
///
/// A result either carries a score or an error, never both: failed results
/// always score 0.0. The only ways to build one are [`TaskResult::scored`]
/// and [`TaskResult::failed`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "TaskResultRecord")]
pub struct TaskResult {
    task_id: String,
    run_id: RunId,
    strategy: StrategyKind,
    actual_answer: String,
    expected_answer: String,
    score: f64,
    latency_ms: f64,
    tokens_used: u64,
    error: Option<String>,
}

impl TaskResult {
    /// A successful answer. The score is clamped into [0, 1].
    pub fn scored(
        task_id: impl Into<String>,
        run_id: RunId,
        strategy: StrategyKind,
        expected_answer: impl Into<String>,
        actual_answer: impl Into<String>,
        score: f64,
    ) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            task_id: task_id.into(),
            run_id,
            strategy,
            actual_answer: actual_answer.into(),
            expected_answer: expected_answer.into(),
            score,
            latency_ms: 0.0,
            tokens_used: 0,
            error: None,
        }
    }

    /// A task that could not be answered.
    pub fn failed(
        task_id: impl Into<String>,
        run_id: RunId,
        strategy: StrategyKind,
        expected_answer: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            run_id,
            strategy,
            actual_answer: String::new(),
            expected_answer: expected_answer.into(),
            score: 0.0,
            latency_ms: 0.0,
            tokens_used: 0,
            error: Some(error.into()),
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = latency_ms.max(0.0);
        self
    }

    pub fn with_tokens_used(mut self, tokens_used: u64) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn actual_answer(&self) -> &str {
        &self.actual_answer
    }

    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Score counts as a full match.
    pub fn is_correct(&self) -> bool {
        self.is_success() && self.score >= 1.0
    }
}

#[derive(Deserialize)]
struct TaskResultRecord {
    task_id: String,
    run_id: RunId,
    strategy: StrategyKind,
    #[serde(default)]
    actual_answer: String,
    #[serde(default)]
    expected_answer: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    latency_ms: f64,
    #[serde(default)]
    tokens_used: u64,
    #[serde(default)]
    error: Option<String>,
}

impl From<TaskResultRecord> for TaskResult {
    fn from(record: TaskResultRecord) -> Self {
        let result = match record.error {
            Some(error) => TaskResult::failed(
                record.task_id,
                record.run_id,
                record.strategy,
                record.expected_answer,
                error,
            ),
            None => TaskResult::scored(
                record.task_id,
                record.run_id,
                record.strategy,
                record.expected_answer,
                record.actual_answer,
                record.score,
            ),
        };
        result
            .with_latency_ms(record.latency_ms)
            .with_tokens_used(record.tokens_used)
    }
}

// ===== Chunk Finding =====

/// Per-chunk relevance verdict produced during the map phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChunkFinding {
    #[serde(default)]
    pub relevant: bool,
    #[serde(default)]
    pub findings: Option<String>,
}

impl ChunkFinding {
    pub fn relevant(findings: impl Into<String>) -> Self {
        Self {
            relevant: true,
            findings: Some(findings.into()),
        }
    }

    /// Fallback for replies that could not be parsed.
    pub fn irrelevant() -> Self {
        Self::default()
    }

    /// Findings text worth passing to synthesis, if any.
    pub fn usable_findings(&self) -> Option<&str> {
        if !self.relevant {
            return None;
        }
        self.findings
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_scores_zero() {
        let result = TaskResult::failed(
            "t1",
            RunId::from("abcd1234"),
            StrategyKind::Truncation,
            "42",
            "boom",
        );
        assert_eq!(result.score(), 0.0);
        assert_eq!(result.error(), Some("boom"));
        assert!(!result.is_success());
    }

    #[test]
    fn test_deserialized_error_forces_zero_score() {
        let json = serde_json::json!({
            "task_id": "t1",
            "run_id": "abcd1234",
            "strategy": "truncation",
            "actual_answer": "x",
            "expected_answer": "y",
            "score": 0.9,
            "latency_ms": 12.5,
            "tokens_used": 7,
            "error": "timeout"
        });
        let result: TaskResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.score(), 0.0);
        assert_eq!(result.latency_ms(), 12.5);
        assert_eq!(result.tokens_used(), 7);
    }

    #[test]
    fn test_usable_findings() {
        assert_eq!(ChunkFinding::irrelevant().usable_findings(), None);
        assert_eq!(ChunkFinding::relevant("  ").usable_findings(), None);
        assert_eq!(ChunkFinding::relevant(" x ").usable_findings(), Some("x"));
        let hidden = ChunkFinding {
            relevant: false,
            findings: Some("ignored".into()),
        };
        assert_eq!(hidden.usable_findings(), None);
    }
}
