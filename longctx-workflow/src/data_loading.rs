use async_trait::async_trait;
use longctx_core::{AnswerType, CoreError, Result, Task, TaskFilter, TaskProvider};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use validator::Validate;

/// Metadata fields copied from a dataset row onto the task.
const METADATA_FIELDS: [&str; 4] =
    ["task_group", "num_labels", "context_window_id", "input_subset"];

/// One line of an OOLONG-style JSONL export.
#[derive(Debug, Clone, Deserialize)]
struct DatasetRow {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    dataset: Option<String>,
    #[serde(default)]
    context_window_text: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: serde_json::Value,
    #[serde(default)]
    answer_type: Option<String>,
    #[serde(default)]
    task: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DatasetRow {
    fn into_task(self, line_index: usize) -> Task {
        let id = self
            .id
            .as_ref()
            .map(value_to_text)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| line_index.to_string());

        let expected = value_to_text(&self.answer)
            .trim_matches(|c| c == '[' || c == ']')
            .to_string();

        let metadata: serde_json::Map<String, serde_json::Value> = METADATA_FIELDS
            .iter()
            .filter_map(|key| self.extra.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();

        Task::new(
            id,
            self.dataset.unwrap_or_else(|| "unknown".to_string()),
            self.context_window_text,
            self.question,
            expected,
            AnswerType::from_label(self.answer_type.as_deref().unwrap_or("LABEL")),
        )
        .with_task_type(self.task.unwrap_or_default())
        .with_metadata(serde_json::Value::Object(metadata))
    }
}

/// Tasks read from a local JSONL export of the benchmark dataset.
#[derive(Debug, Clone)]
pub struct JsonlTaskSource {
    path: PathBuf,
}

impl JsonlTaskSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every parseable row, in file order. Bad lines are skipped with a warning.
    pub async fn read_all(&self) -> Result<Vec<Task>> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            CoreError::Io(format!("Cannot read dataset {}: {}", self.path.display(), e))
        })?;

        let mut tasks = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DatasetRow>(line) {
                Ok(row) => {
                    let task = row.into_task(index);
                    if let Err(err) = task.validate() {
                        tracing::warn!("Skipping dataset line {}: {}", index + 1, err);
                        continue;
                    }
                    tasks.push(task);
                }
                Err(err) => {
                    tracing::warn!("Skipping malformed dataset line {}: {}", index + 1, err)
                }
            }
        }
        Ok(tasks)
    }
}

#[async_trait]
impl TaskProvider for JsonlTaskSource {
    async fn load_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let all = self.read_all().await?;
        let total = all.len();

        let tasks: Vec<Task> = all
            .into_iter()
            .filter(|task| filter.matches(task))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();

        tracing::info!(
            "Loaded {} of {} tasks from {} (dataset={}, min_context={})",
            tasks.len(),
            total,
            self.path.display(),
            filter.dataset.as_deref().unwrap_or("*"),
            filter.min_context_length
        );
        Ok(tasks)
    }
}

// ===== Dataset Statistics =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContextLengthStats {
    pub min: usize,
    pub max: usize,
    pub avg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DatasetStats {
    pub total_rows: usize,
    pub filtered_count: usize,
    pub dataset_filter: Option<String>,
    pub context_length: ContextLengthStats,
    pub task_types: BTreeMap<String, usize>,
    pub answer_types: BTreeMap<String, usize>,
}

/// Shape of the tasks that pass the dataset filter. Length and limit are ignored.
pub fn dataset_stats(tasks: &[Task], dataset: Option<&str>) -> DatasetStats {
    let selected: Vec<&Task> = tasks
        .iter()
        .filter(|t| dataset.map_or(true, |d| d.is_empty() || t.dataset() == d))
        .collect();

    let lengths: Vec<usize> = selected.iter().map(|t| t.context_length()).collect();
    let context_length = if lengths.is_empty() {
        ContextLengthStats::default()
    } else {
        ContextLengthStats {
            min: lengths.iter().copied().min().unwrap_or(0),
            max: lengths.iter().copied().max().unwrap_or(0),
            avg: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
        }
    };

    let mut task_types = BTreeMap::new();
    let mut answer_types = BTreeMap::new();
    for task in &selected {
        let task_type = if task.task_type().is_empty() { "unknown" } else { task.task_type() };
        *task_types.entry(task_type.to_string()).or_insert(0) += 1;
        *answer_types.entry(task.answer_type().to_string()).or_insert(0) += 1;
    }

    DatasetStats {
        total_rows: tasks.len(),
        filtered_count: selected.len(),
        dataset_filter: dataset.map(str::to_string),
        context_length,
        task_types,
        answer_types,
    }
}
