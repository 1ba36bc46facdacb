use longctx_core::{
    BenchmarkRun, ResultStore, RunId, RunStats, Task, TaskResult, META_ABANDONED, META_TIMED_OUT,
};
use longctx_metrics::run_stats;
use serde_json::json;
use std::sync::Arc;

use crate::lifecycle::{HandoffOutcome, LifecycleCoordinator};
use crate::strategy::AnsweringStrategy;

/// Reported after each task.
#[derive(Debug, Clone, Copy)]
pub struct RunProgress<'a> {
    /// 1-based position of the task just finished.
    pub position: usize,
    pub total: usize,
    pub task_id: &'a str,
    pub outcome: &'a str,
    pub result: Option<&'a TaskResult>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    /// Results in task submission order.
    pub results: Vec<TaskResult>,
    pub abandoned: usize,
    pub timed_out: usize,
    pub stats: RunStats,
}

impl RunReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            results: Vec::new(),
            abandoned: 0,
            timed_out: 0,
            stats: RunStats::default(),
        }
    }
}

/// Drives the tasks of one run strictly one after another.
///
/// Store failures are logged and never abort the run.
pub struct BenchmarkRunner {
    store: Arc<dyn ResultStore>,
}

impl BenchmarkRunner {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    pub async fn run_in_process<P>(
        &self,
        strategy: &dyn AnsweringStrategy,
        run: &mut BenchmarkRun,
        tasks: &[Task],
        mut on_progress: P,
    ) -> RunReport
    where
        P: FnMut(RunProgress<'_>),
    {
        self.start(run, tasks).await;
        let mut report = RunReport::new(run.id.clone());

        for (index, task) in tasks.iter().enumerate() {
            let result = strategy.execute(task, &run.id).await;
            self.save_result(&result).await;

            on_progress(RunProgress {
                position: index + 1,
                total: tasks.len(),
                task_id: task.id(),
                outcome: if result.is_success() { "completed" } else { "failed" },
                result: Some(&result),
            });
            report.results.push(result);
        }

        self.finish(run, report).await
    }

    pub async fn run_out_of_process<P>(
        &self,
        coordinator: &LifecycleCoordinator,
        run: &mut BenchmarkRun,
        tasks: &[Task],
        mut on_progress: P,
    ) -> RunReport
    where
        P: FnMut(RunProgress<'_>),
    {
        self.start(run, tasks).await;
        let mut report = RunReport::new(run.id.clone());

        for (index, task) in tasks.iter().enumerate() {
            let outcome = match coordinator.run_task(task, &run.id).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!("Could not hand off task {}: {}", task.id(), err);
                    HandoffOutcome::Completed(TaskResult::failed(
                        task.id(),
                        run.id.clone(),
                        coordinator.strategy(),
                        task.expected_answer(),
                        format!("Hand-off failed: {}", err),
                    ))
                }
            };

            match &outcome {
                HandoffOutcome::Completed(result) => self.save_result(result).await,
                HandoffOutcome::Abandoned => report.abandoned += 1,
                HandoffOutcome::TimedOut => report.timed_out += 1,
            }

            on_progress(RunProgress {
                position: index + 1,
                total: tasks.len(),
                task_id: task.id(),
                outcome: outcome.label(),
                result: outcome.result(),
            });

            if let HandoffOutcome::Completed(result) = outcome {
                report.results.push(result);
            }
        }

        report_lost_tasks(run, &report);
        self.finish(run, report).await
    }

    async fn start(&self, run: &mut BenchmarkRun, tasks: &[Task]) {
        run.tasks_total = tasks.len() as u64;
        tracing::info!(
            "Starting run {} ({}, {}) with {} tasks",
            run.id,
            run.strategy,
            run.mode,
            tasks.len()
        );
        if let Err(err) = self.store.save_run(run).await {
            tracing::warn!("Failed to save run {}: {}", run.id, err);
        }
    }

    async fn save_result(&self, result: &TaskResult) {
        if let Err(err) = self.store.save_result(result).await {
            tracing::warn!("Failed to save result for task {}: {}", result.task_id(), err);
        }
    }

    async fn finish(&self, run: &mut BenchmarkRun, mut report: RunReport) -> RunReport {
        if let Err(err) = self.store.save_run(run).await {
            tracing::warn!("Failed to save run {}: {}", run.id, err);
        }

        let stats = match self.store.update_run_stats(&run.id).await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!("Failed to update stats for run {}: {}", run.id, err);
                run_stats(&report.results)
            }
        };
        run.apply_stats(&stats);
        report.stats = stats;

        tracing::info!(
            "Finished run {}: {} completed, {} failed, avg score {:.4}",
            run.id,
            stats.tasks_completed,
            stats.tasks_failed,
            stats.avg_score
        );
        report
    }
}

fn report_lost_tasks(run: &mut BenchmarkRun, report: &RunReport) {
    run.set_metadata(META_ABANDONED, json!(report.abandoned));
    run.set_metadata(META_TIMED_OUT, json!(report.timed_out));
    if report.abandoned + report.timed_out > 0 {
        tracing::warn!(
            "Run {}: {} tasks abandoned, {} timed out",
            run.id,
            report.abandoned,
            report.timed_out
        );
    }
}
