use async_trait::async_trait;
use longctx_core::{
    AnswerRequest, AnsweringEngine, ResponseFormat, Result, RunId, StrategyConfig, StrategyKind,
    Task, TaskResult,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use super::{scored_execution, AnsweringStrategy};
use crate::extract::{parse_answer_output, ParsedAnswer};

/// Inserted between the kept head and tail of a truncated context.
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]\n\n";

/// Share of the character budget kept from the start, as a fraction `num / den`.
const HEAD_SHARE: (usize, usize) = (3, 5);

/// Fit `context` into `max_chars` characters (plus the marker).
///
/// Short contexts come back borrowed and untouched. Longer ones keep the
/// first `floor(0.6 * max_chars)` characters and the remaining budget from
/// the end.
pub fn truncate_context(context: &str, max_chars: usize) -> Cow<'_, str> {
    let total = context.chars().count();
    if total <= max_chars {
        return Cow::Borrowed(context);
    }

    let head_chars = max_chars * HEAD_SHARE.0 / HEAD_SHARE.1;
    let tail_chars = max_chars - head_chars;

    let head_end = byte_offset(context, head_chars);
    let tail_start = byte_offset(context, total - tail_chars);

    let capacity = head_end + TRUNCATION_MARKER.len() + context.len() - tail_start;
    let mut truncated = String::with_capacity(capacity);
    truncated.push_str(&context[..head_end]);
    truncated.push_str(TRUNCATION_MARKER);
    truncated.push_str(&context[tail_start..]);
    Cow::Owned(truncated)
}

// Byte index of the `n`th character, or the end of the string.
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(idx, _)| idx)
}

pub fn build_direct_prompt(context: &str, question: &str) -> String {
    format!(
        "Analyze the following data and answer the question.\n\n\
         <context>\n{context}\n</context>\n\n\
         Question: {question}\n\n\
         Provide only the answer, nothing else. Be concise."
    )
}

/// Single call over the (possibly truncated) full context.
pub struct DirectContextStrategy {
    engine: Arc<dyn AnsweringEngine>,
    model: String,
    max_context_chars: usize,
    timeout: Duration,
}

impl DirectContextStrategy {
    pub fn new(engine: Arc<dyn AnsweringEngine>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
            max_context_chars: longctx_core::DEFAULT_MAX_CONTEXT_CHARS,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(engine: Arc<dyn AnsweringEngine>, config: &StrategyConfig) -> Self {
        Self::new(engine, config.engine.model.clone())
            .with_max_context_chars(config.truncation.max_context_chars)
            .with_timeout(config.truncation.timeout())
    }

    pub fn with_max_context_chars(mut self, max_context_chars: usize) -> Self {
        self.max_context_chars = max_context_chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn answer(&self, task: &Task) -> Result<ParsedAnswer> {
        let context = truncate_context(task.context(), self.max_context_chars);
        if matches!(context, Cow::Owned(_)) {
            tracing::debug!(
                "Truncated task {} context from {} to {} chars",
                task.id(),
                task.context_length(),
                self.max_context_chars
            );
        }

        let prompt = build_direct_prompt(&context, task.question());
        let request = AnswerRequest::new(&self.model, prompt)
            .with_format(ResponseFormat::Json)
            .with_timeout(self.timeout);

        let raw = self.engine.answer(&request).await?;
        Ok(parse_answer_output(&raw))
    }
}

#[async_trait]
impl AnsweringStrategy for DirectContextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Truncation
    }

    async fn execute(&self, task: &Task, run_id: &RunId) -> TaskResult {
        scored_execution(self.kind(), task, run_id, self.answer(task)).await
    }
}
