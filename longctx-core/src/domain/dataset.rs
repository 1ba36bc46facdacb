use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::CoreError;

/// Dataset tag used when no filter is supplied.
pub const DEFAULT_DATASET: &str = "trec_coarse";

/// Minimum context length (in characters) for a task to be considered long-context.
pub const DEFAULT_MIN_CONTEXT_LENGTH: usize = 100_000;

// ===== Answer Type =====

/// Comparison policy family for a gold answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnswerType {
    Numeric,
    Label,
    Comparison,
    Date,
}

impl AnswerType {
    /// Map a dataset's answer-type label onto the closed set of comparators.
    ///
    /// Unknown labels score with the exact-match comparator.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "NUMERIC" | "NUMERIC_ONE_CLASS" => AnswerType::Numeric,
            "LABEL" => AnswerType::Label,
            "COMPARISON" => AnswerType::Comparison,
            "DATE" => AnswerType::Date,
            _ => AnswerType::Label,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerType::Numeric => "NUMERIC",
            AnswerType::Label => "LABEL",
            AnswerType::Comparison => "COMPARISON",
            AnswerType::Date => "DATE",
        }
    }
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NUMERIC" => Ok(AnswerType::Numeric),
            "LABEL" => Ok(AnswerType::Label),
            "COMPARISON" => Ok(AnswerType::Comparison),
            "DATE" => Ok(AnswerType::Date),
            other => Err(CoreError::Validation(format!("Unknown answer type: {}", other))),
        }
    }
}

// ===== Task =====

/// One (context, question, gold answer) evaluation unit.
///
/// Tasks are read-only once built. `context_length` is derived from the
/// context when the task is constructed or deserialized and cannot be set
/// independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(from = "TaskRecord")]
pub struct Task {
    #[validate(length(min = 1, max = 255))]
    id: String,
    dataset: String,
    context: String,
    #[validate(length(min = 1))]
    question: String,
    expected_answer: String,
    answer_type: AnswerType,
    context_length: usize,
    task_type: String,
    metadata: serde_json::Value,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        dataset: impl Into<String>,
        context: impl Into<String>,
        question: impl Into<String>,
        expected_answer: impl Into<String>,
        answer_type: AnswerType,
    ) -> Self {
        let context = context.into();
        let context_length = context.chars().count();
        Self {
            id: id.into(),
            dataset: dataset.into(),
            context,
            question: question.into(),
            expected_answer: expected_answer.into(),
            answer_type,
            context_length,
            task_type: String::new(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn expected_answer(&self) -> &str {
        &self.expected_answer
    }

    pub fn answer_type(&self) -> AnswerType {
        self.answer_type
    }

    /// Character length of the context.
    pub fn context_length(&self) -> usize {
        self.context_length
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }
}

/// Wire shape of a task. Any serialized `context_length` is ignored.
#[derive(Deserialize)]
struct TaskRecord {
    id: String,
    dataset: String,
    context: String,
    question: String,
    expected_answer: String,
    answer_type: AnswerType,
    #[serde(default)]
    task_type: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Task::new(
            record.id,
            record.dataset,
            record.context,
            record.question,
            record.expected_answer,
            record.answer_type,
        )
        .with_task_type(record.task_type)
        .with_metadata(record.metadata)
    }
}

// ===== Task Filter =====

/// Selection criteria handed to a task provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskFilter {
    pub dataset: Option<String>,
    pub min_context_length: usize,
    pub limit: Option<usize>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            dataset: Some(DEFAULT_DATASET.to_string()),
            min_context_length: DEFAULT_MIN_CONTEXT_LENGTH,
            limit: None,
        }
    }
}

impl TaskFilter {
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn any_dataset(mut self) -> Self {
        self.dataset = None;
        self
    }

    pub fn with_min_context_length(mut self, min: usize) -> Self {
        self.min_context_length = min;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a task passes the dataset and length criteria. The limit is
    /// applied by the provider.
    pub fn matches(&self, task: &Task) -> bool {
        let dataset_ok = self
            .dataset
            .as_deref()
            .map_or(true, |d| d.is_empty() || task.dataset() == d);
        dataset_ok && task.context_length() >= self.min_context_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_length_counts_chars() {
        let task = Task::new("t1", "ds", "héllo", "q?", "a", AnswerType::Label);
        assert_eq!(task.context_length(), 5);
    }

    #[test]
    fn test_deserialize_recomputes_context_length() {
        let json = serde_json::json!({
            "id": "t1",
            "dataset": "ds",
            "context": "abcdef",
            "question": "q?",
            "expected_answer": "a",
            "answer_type": "LABEL",
            "context_length": 9999
        });
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.context_length(), 6);
    }

    #[test]
    fn test_answer_type_from_label() {
        assert_eq!(AnswerType::from_label("numeric"), AnswerType::Numeric);
        assert_eq!(AnswerType::from_label("NUMERIC_ONE_CLASS"), AnswerType::Numeric);
        assert_eq!(AnswerType::from_label("DATE"), AnswerType::Date);
        assert_eq!(AnswerType::from_label("whatever"), AnswerType::Label);
    }
}
