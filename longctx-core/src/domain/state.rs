use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::dataset::{AnswerType, Task};
use super::evaluation::TaskResult;
use super::ids::RunId;
use super::run::StrategyKind;
use crate::error::{CoreError, Result};

// ===== Task Status =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Task State =====

/// Hand-off record shared between the coordinator and the external agent.
///
/// The coordinator creates the record in `Pending` and deletes it when done.
/// The agent moves it to `InProgress` when it picks the task up and to
/// `Completed` once it has an answer. Status only moves forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskState {
    pub task_id: String,
    pub run_id: RunId,
    pub context: String,
    pub question: String,
    pub expected_answer: String,
    pub answer_type: AnswerType,
    pub strategy: StrategyKind,
    status: TaskStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<TaskResult>,
}

impl TaskState {
    pub fn pending(task: &Task, run_id: RunId, strategy: StrategyKind) -> Self {
        Self {
            task_id: task.id().to_string(),
            run_id,
            context: task.context().to_string(),
            question: task.question().to_string(),
            expected_answer: task.expected_answer().to_string(),
            answer_type: task.answer_type(),
            strategy,
            status: TaskStatus::Pending,
            start_time: Utc::now(),
            context_file: None,
            result: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn result(&self) -> Option<&TaskResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<TaskResult> {
        self.result
    }

    /// Pending -> InProgress.
    pub fn begin(&mut self) -> Result<()> {
        if self.status != TaskStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "Cannot begin task {} in status {}",
                self.task_id, self.status
            )));
        }
        self.status = TaskStatus::InProgress;
        Ok(())
    }

    /// InProgress -> Completed, attaching the result payload.
    pub fn complete(&mut self, result: TaskResult) -> Result<()> {
        if self.status != TaskStatus::InProgress {
            return Err(CoreError::InvalidState(format!(
                "Cannot complete task {} in status {}",
                self.task_id, self.status
            )));
        }
        if result.task_id() != self.task_id {
            return Err(CoreError::Validation(format!(
                "Result for task {} does not belong to task {}",
                result.task_id(),
                self.task_id
            )));
        }
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        Ok(())
    }

    /// Milliseconds elapsed since the record was created.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now.signed_duration_since(self.start_time);
        (elapsed.num_microseconds().unwrap_or(i64::MAX) as f64 / 1000.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> TaskState {
        let task = Task::new("t1", "ds", "ctx", "q?", "7", AnswerType::Numeric);
        TaskState::pending(&task, RunId::from("r1"), StrategyKind::Truncation)
    }

    #[test]
    fn test_forward_transitions() {
        let mut state = sample_state();
        assert_eq!(state.status(), TaskStatus::Pending);
        state.begin().unwrap();
        assert_eq!(state.status(), TaskStatus::InProgress);

        let result =
            TaskResult::scored("t1", RunId::from("r1"), StrategyKind::Truncation, "7", "7", 1.0);
        state.complete(result).unwrap();
        assert!(state.status().is_terminal());
        assert_eq!(state.result().map(|r| r.score()), Some(1.0));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let mut state = sample_state();
        let result =
            TaskResult::scored("t1", RunId::from("r1"), StrategyKind::Truncation, "7", "7", 1.0);
        assert!(matches!(state.complete(result), Err(CoreError::InvalidState(_))));

        state.begin().unwrap();
        assert!(matches!(state.begin(), Err(CoreError::InvalidState(_))));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let mut state = sample_state();
        state.begin().unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["answer_type"], "NUMERIC");
    }
}
