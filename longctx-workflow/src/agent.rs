//! Agent side of the hand-off: run from the agent's session hooks.

use chrono::Utc;
use longctx_core::{
    Result, StrategyKind, TaskResult, TaskState, TaskStatus, DEFAULT_MAX_CONTEXT_CHARS,
};
use longctx_metrics::score_answer;
use std::path::Path;
use tokio::fs;

use crate::extract::{extract_session_answer, SessionReport, ANSWER_MARKER};
use crate::lifecycle::TaskStateStore;
use crate::strategy::truncate_context;

#[derive(Debug, Clone)]
pub struct AgentPromptConfig {
    /// Inline context budget for the truncation strategy.
    pub max_context_chars: usize,
}

impl Default for AgentPromptConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

fn answer_instruction() -> String {
    format!(
        "Output ONLY the final answer on a single line prefixed with \"{} \"",
        ANSWER_MARKER
    )
}

/// Injection prompt for a task that has just been picked up.
pub fn build_injection_prompt(
    state: &TaskState,
    context_file: &Path,
    config: &AgentPromptConfig,
) -> String {
    let task_id = &state.task_id;
    let question = &state.question;
    let instruction = answer_instruction();

    match state.strategy {
        StrategyKind::MapReduce => {
            let path = context_file.display();
            format!(
                "<benchmark-task id=\"{task_id}\">\n\
                 You are being evaluated on a long-context reasoning benchmark using a chunked analysis pattern.\n\n\
                 The context document is located at: {path}\n\n\
                 Process this large document in chunks:\n\
                 1. Load and split the file at {path}\n\
                 2. Query each chunk for: \"{question}\"\n\n\
                 Collect findings from the relevant chunks and synthesize them into one answer.\n\n\
                 After getting the synthesized answer, {instruction}\n\
                 </benchmark-task>"
            )
        }
        StrategyKind::Truncation => {
            let context = truncate_context(&state.context, config.max_context_chars);
            format!(
                "<benchmark-task id=\"{task_id}\">\n\
                 You are being evaluated on a long-context reasoning benchmark.\n\n\
                 <context>\n{context}\n</context>\n\n\
                 <question>\n{question}\n</question>\n\n\
                 Analyze the context above and answer the question.\n\
                 {instruction}\n\
                 </benchmark-task>"
            )
        }
    }
}

/// Session start: take the pending task, if there is one.
///
/// Moves the record to `InProgress`, writes the context next to it and
/// returns the prompt to inject. Returns `Ok(None)` when there is no record
/// or it is not pending.
pub async fn accept_pending(
    store: &TaskStateStore,
    config: &AgentPromptConfig,
) -> Result<Option<String>> {
    let Some(mut state) = store.read().await? else {
        return Ok(None);
    };
    if state.status() != TaskStatus::Pending {
        tracing::debug!("Task {} is {}, nothing to accept", state.task_id, state.status());
        return Ok(None);
    }

    state.begin()?;

    let context_file = store.context_file_path(&state.task_id);
    fs::create_dir_all(store.dir()).await?;
    fs::write(&context_file, &state.context).await?;
    state.context_file = Some(context_file.clone());
    store.write(&state).await?;

    tracing::info!("Accepted task {} ({})", state.task_id, state.strategy);
    Ok(Some(build_injection_prompt(&state, &context_file, config)))
}

/// Session stop: score the agent's answer and complete the record.
///
/// Returns `Ok(None)` when no task is in progress.
pub async fn complete_in_progress(
    store: &TaskStateStore,
    report: &SessionReport,
) -> Result<Option<TaskResult>> {
    let Some(mut state) = store.read().await? else {
        return Ok(None);
    };
    if state.status() != TaskStatus::InProgress {
        tracing::debug!("Task {} is {}, nothing to complete", state.task_id, state.status());
        return Ok(None);
    }

    let answer = extract_session_answer(report);
    let score = score_answer(&state.expected_answer, &answer, Some(state.answer_type));
    let latency_ms = state.elapsed_ms(Utc::now());

    let result = TaskResult::scored(
        state.task_id.clone(),
        state.run_id.clone(),
        state.strategy,
        state.expected_answer.clone(),
        answer,
        score,
    )
    .with_latency_ms(latency_ms)
    .with_tokens_used(report.output_tokens());

    state.complete(result.clone())?;
    store.write(&state).await?;

    tracing::info!("Task {}: score={:.4}", result.task_id(), result.score());
    Ok(Some(result))
}
