pub mod direct;
pub mod map_reduce;

pub use direct::*;
pub use map_reduce::*;

use async_trait::async_trait;
use longctx_core::{
    AnsweringEngine, Chunker, Result, RunId, StrategyConfig, StrategyKind, Task, TaskResult,
};
use longctx_metrics::score_answer;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::extract::ParsedAnswer;

/// Policy for turning a task into a scored result.
///
/// `execute` never fails: any error along the way becomes a failed result
/// with a zero score. Latency covers the whole call either way.
#[async_trait]
pub trait AnsweringStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn execute(&self, task: &Task, run_id: &RunId) -> TaskResult;
}

/// Resolve a strategy tag into a ready-to-run strategy.
pub fn build_strategy(
    kind: StrategyKind,
    config: &StrategyConfig,
    engine: Arc<dyn AnsweringEngine>,
    chunker: Arc<dyn Chunker>,
) -> Box<dyn AnsweringStrategy> {
    match kind {
        StrategyKind::Truncation => Box::new(DirectContextStrategy::from_config(engine, config)),
        StrategyKind::MapReduce => {
            Box::new(MapReduceStrategy::from_config(engine, chunker, config))
        }
    }
}

/// Time `answer`, score its output against the task and fold any error into the result.
pub(crate) async fn scored_execution<F>(
    kind: StrategyKind,
    task: &Task,
    run_id: &RunId,
    answer: F,
) -> TaskResult
where
    F: Future<Output = Result<ParsedAnswer>>,
{
    let started = Instant::now();
    let outcome = answer.await;

    let result = match outcome {
        Ok(parsed) => {
            let score =
                score_answer(task.expected_answer(), &parsed.answer, Some(task.answer_type()));
            TaskResult::scored(
                task.id(),
                run_id.clone(),
                kind,
                task.expected_answer(),
                parsed.answer,
                score,
            )
            .with_tokens_used(parsed.tokens_used)
        }
        Err(err) => {
            tracing::warn!("Task {} failed under {}: {}", task.id(), kind, err);
            TaskResult::failed(
                task.id(),
                run_id.clone(),
                kind,
                task.expected_answer(),
                err.to_string(),
            )
        }
    };

    result.with_latency_ms(started.elapsed().as_secs_f64() * 1000.0)
}
