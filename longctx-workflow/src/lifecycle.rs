//! File-backed hand-off of one task at a time to an external agent.
//!
//! Only one coordinator may own a state directory at a time; nothing here
//! locks the directory.

use longctx_core::{
    AgentLauncher, CoreError, LifecycleConfig, Result, RunId, StrategyKind, Task, TaskResult,
    TaskState, TaskStatus,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::time::{sleep, Instant};

pub const STATE_FILE_NAME: &str = "current_task.json";

// ===== State Store =====

/// The shared record at `<dir>/current_task.json`.
///
/// Writes go through a temporary file and a rename, so readers never see a
/// partially written record.
#[derive(Debug, Clone)]
pub struct TaskStateStore {
    dir: PathBuf,
}

impl TaskStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE_NAME)
    }

    /// Where the agent side drops the full context for a task.
    pub fn context_file_path(&self, task_id: &str) -> PathBuf {
        let safe_id: String = task_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("context_{}.txt", safe_id))
    }

    pub async fn write(&self, state: &TaskState) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let payload = serde_json::to_vec(state)?;
        let tmp_path = self.dir.join(format!("{}.tmp", STATE_FILE_NAME));
        fs::write(&tmp_path, payload).await?;
        fs::rename(&tmp_path, self.state_path()).await?;
        Ok(())
    }

    /// `Ok(None)` when no record exists.
    pub async fn read(&self) -> Result<Option<TaskState>> {
        match fs::read(self.state_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove the record and the context file it points at. Missing files are fine.
    pub async fn clear(&self) -> Result<()> {
        let context_file = match self.read().await {
            Ok(Some(state)) => state.context_file,
            _ => None,
        };

        remove_if_exists(&self.state_path()).await?;
        if let Some(path) = context_file {
            remove_if_exists(&path).await?;
        }
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CoreError::Io(format!("Cannot remove {}: {}", path.display(), err))),
    }
}

// ===== Coordinator =====

/// How a single hand-off ended.
#[derive(Debug, Clone, PartialEq)]
pub enum HandoffOutcome {
    /// The agent completed the record.
    Completed(TaskResult),
    /// The record disappeared before completion.
    Abandoned,
    /// The completion deadline passed.
    TimedOut,
}

impl HandoffOutcome {
    pub fn result(&self) -> Option<&TaskResult> {
        match self {
            HandoffOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HandoffOutcome::Completed(_) => "completed",
            HandoffOutcome::Abandoned => "abandoned",
            HandoffOutcome::TimedOut => "timed_out",
        }
    }
}

pub struct LifecycleCoordinator {
    store: TaskStateStore,
    launcher: Arc<dyn AgentLauncher>,
    strategy: StrategyKind,
    config: LifecycleConfig,
}

impl LifecycleCoordinator {
    pub fn new(
        store: TaskStateStore,
        launcher: Arc<dyn AgentLauncher>,
        strategy: StrategyKind,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            store,
            launcher,
            strategy,
            config,
        }
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    pub fn store(&self) -> &TaskStateStore {
        &self.store
    }

    /// Hand `task` to the agent and wait for the outcome.
    ///
    /// Fails only if the pending record cannot be written. The record is
    /// cleared before returning in every other case.
    pub async fn run_task(&self, task: &Task, run_id: &RunId) -> Result<HandoffOutcome> {
        self.store.clear().await?;
        self.store
            .write(&TaskState::pending(task, run_id.clone(), self.strategy))
            .await?;

        tracing::info!("Handing task {} to agent", task.id());
        if let Err(err) = self.launcher.launch(&self.config.trigger_prompt).await {
            tracing::warn!("Agent session for task {} ended with error: {}", task.id(), err);
        }

        let outcome = self.wait_for_completion(task.id()).await;

        if let Err(err) = self.store.clear().await {
            tracing::warn!("Failed to clear state for task {}: {}", task.id(), err);
        }

        match &outcome {
            HandoffOutcome::Completed(result) => {
                tracing::info!("Task {} completed with score {:.4}", task.id(), result.score())
            }
            HandoffOutcome::Abandoned => tracing::warn!(
                "Task {} abandoned: state record removed before completion",
                task.id()
            ),
            HandoffOutcome::TimedOut => tracing::warn!(
                "Task {} timed out after {}s without completion",
                task.id(),
                self.config.completion_timeout_secs
            ),
        }

        Ok(outcome)
    }

    async fn wait_for_completion(&self, task_id: &str) -> HandoffOutcome {
        let deadline = Instant::now() + self.config.completion_timeout();

        loop {
            match self.store.read().await {
                Ok(None) => return HandoffOutcome::Abandoned,
                Ok(Some(state)) if state.status() == TaskStatus::Completed => {
                    return HandoffOutcome::Completed(completed_result(state));
                }
                Ok(Some(_)) => {}
                Err(err) => tracing::warn!("Unreadable state record for task {}: {}", task_id, err),
            }

            if Instant::now() >= deadline {
                return HandoffOutcome::TimedOut;
            }
            sleep(self.config.poll_interval()).await;
        }
    }
}

fn completed_result(state: TaskState) -> TaskResult {
    let task_id = state.task_id.clone();
    let run_id = state.run_id.clone();
    let strategy = state.strategy;
    let expected = state.expected_answer.clone();

    state.into_result().unwrap_or_else(|| {
        TaskResult::failed(
            task_id,
            run_id,
            strategy,
            expected,
            "Agent marked the task completed without a result payload",
        )
    })
}
