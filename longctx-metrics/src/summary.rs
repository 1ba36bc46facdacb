//! Run-level rollups over per-task results.

use longctx_core::{BenchmarkRun, RunComparison, RunStats, RunSummary, TaskResult};

use crate::aggregators::MetricAggregator;

/// Counters for a run record.
///
/// The average score only covers results without an error; latency covers
/// every result.
pub fn run_stats(results: &[TaskResult]) -> RunStats {
    let scores: Vec<f64> = results
        .iter()
        .filter(|r| r.is_success())
        .map(TaskResult::score)
        .collect();

    RunStats {
        tasks_total: results.len() as u64,
        tasks_completed: scores.len() as u64,
        tasks_failed: (results.len() - scores.len()) as u64,
        avg_score: MetricAggregator::mean_or_zero(&scores),
        total_latency_ms: results.iter().map(TaskResult::latency_ms).sum(),
    }
}

/// Summary statistics for one run. Empty runs summarize to zeros.
pub fn summarize_run(run: &BenchmarkRun, results: &[TaskResult]) -> RunSummary {
    let scores: Vec<f64> = results
        .iter()
        .filter(|r| r.is_success())
        .map(TaskResult::score)
        .collect();
    let latencies: Vec<f64> = results.iter().map(TaskResult::latency_ms).collect();

    let score_stats = MetricAggregator::aggregate(&scores);
    let latency_stats = MetricAggregator::aggregate(&latencies);

    RunSummary {
        run_id: run.id.clone(),
        strategy: run.strategy,
        mode: run.mode,
        tasks_completed: scores.len() as u64,
        tasks_failed: (results.len() - scores.len()) as u64,
        avg_score: score_stats.mean,
        min_score: score_stats.min,
        max_score: score_stats.max,
        total_latency_ms: latency_stats.sum,
        avg_latency_ms: latency_stats.mean,
    }
}

/// Compare `candidate` against `baseline`.
pub fn compare_runs(baseline: &RunSummary, candidate: &RunSummary) -> RunComparison {
    let improvement_pct = if baseline.avg_score > 0.0 {
        Some((candidate.avg_score - baseline.avg_score) / baseline.avg_score * 100.0)
    } else {
        None
    };

    RunComparison {
        baseline: baseline.clone(),
        candidate: candidate.clone(),
        avg_score_delta: candidate.avg_score - baseline.avg_score,
        min_score_delta: candidate.min_score - baseline.min_score,
        max_score_delta: candidate.max_score - baseline.max_score,
        tasks_completed_delta: candidate.tasks_completed as i64 - baseline.tasks_completed as i64,
        tasks_failed_delta: candidate.tasks_failed as i64 - baseline.tasks_failed as i64,
        avg_latency_delta_ms: candidate.avg_latency_ms - baseline.avg_latency_ms,
        total_latency_delta_ms: candidate.total_latency_ms - baseline.total_latency_ms,
        improvement_pct,
    }
}
