use approx::assert_relative_eq;
use longctx_core::{BenchmarkRun, ExecutionMode, RunId, StrategyKind, TaskResult};
use longctx_metrics::aggregators::MetricAggregator;
use longctx_metrics::summary::{compare_runs, run_stats, summarize_run};
use pretty_assertions::assert_eq;

// ===== Aggregation Tests =====

#[test]
fn test_aggregate_basic_stats() {
    let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let aggregated = MetricAggregator::aggregate(&values);

    assert_eq!(aggregated.count, 5);
    assert_eq!(aggregated.min, 10.0);
    assert_eq!(aggregated.max, 50.0);
    assert_relative_eq!(aggregated.mean, 30.0);
    assert_relative_eq!(aggregated.median, 30.0);
    assert_relative_eq!(aggregated.sum, 150.0);
    assert_relative_eq!(aggregated.std_dev, 200.0f64.sqrt(), epsilon = 1e-9);
}

#[test]
fn test_aggregate_percentiles_ordered() {
    let values: Vec<f64> = (1..=100).rev().map(f64::from).collect();
    let aggregated = MetricAggregator::aggregate(&values);

    assert!(aggregated.p50 <= aggregated.p90);
    assert!(aggregated.p90 <= aggregated.p95);
    assert!(aggregated.p95 <= aggregated.p99);
    assert_eq!(aggregated.max, 100.0);
}

#[test]
fn test_aggregate_empty() {
    let aggregated = MetricAggregator::aggregate(&[]);
    assert_eq!(aggregated.count, 0);
    assert_eq!(aggregated.mean, 0.0);
    assert_eq!(MetricAggregator::mean_or_zero(&[]), 0.0);
}

// ===== Run Summary Tests =====

fn results(run_id: &RunId) -> Vec<TaskResult> {
    vec![
        TaskResult::scored("t1", run_id.clone(), StrategyKind::Truncation, "a", "a", 1.0)
            .with_latency_ms(100.0),
        TaskResult::scored("t2", run_id.clone(), StrategyKind::Truncation, "3", "4", 0.5)
            .with_latency_ms(300.0),
        TaskResult::failed("t3", run_id.clone(), StrategyKind::Truncation, "b", "Timed out")
            .with_latency_ms(200.0),
    ]
}

#[test]
fn test_run_stats_excludes_failures_from_score() {
    let run_id = RunId::from("aaaa1111");
    let stats = run_stats(&results(&run_id));

    assert_eq!(stats.tasks_total, 3);
    assert_eq!(stats.tasks_completed, 2);
    assert_eq!(stats.tasks_failed, 1);
    assert_relative_eq!(stats.avg_score, 0.75);
    assert_relative_eq!(stats.total_latency_ms, 600.0);
}

#[test]
fn test_summarize_run() {
    let run = BenchmarkRun::new(StrategyKind::Truncation, ExecutionMode::InProcess);
    let summary = summarize_run(&run, &results(&run.id));

    assert_eq!(summary.run_id, run.id);
    assert_eq!(summary.tasks_completed, 2);
    assert_eq!(summary.tasks_failed, 1);
    assert_eq!(summary.tasks_total(), 3);
    assert_relative_eq!(summary.avg_score, 0.75);
    assert_eq!(summary.min_score, 0.5);
    assert_eq!(summary.max_score, 1.0);
    assert_relative_eq!(summary.total_latency_ms, 600.0);
    assert_relative_eq!(summary.avg_latency_ms, 200.0);
}

#[test]
fn test_summarize_empty_run() {
    let run = BenchmarkRun::new(StrategyKind::MapReduce, ExecutionMode::OutOfProcess);
    let summary = summarize_run(&run, &[]);

    assert_eq!(summary.tasks_completed, 0);
    assert_eq!(summary.avg_score, 0.0);
    assert_eq!(summary.avg_latency_ms, 0.0);
    assert_eq!(summary.mode, ExecutionMode::OutOfProcess);
}

// ===== Comparison Tests =====

#[test]
fn test_compare_runs() {
    let baseline_run = BenchmarkRun::new(StrategyKind::Truncation, ExecutionMode::InProcess);
    let candidate_run = BenchmarkRun::new(StrategyKind::MapReduce, ExecutionMode::InProcess);

    let baseline = summarize_run(
        &baseline_run,
        &[TaskResult::scored("t", baseline_run.id.clone(), StrategyKind::Truncation, "a", "b", 0.5)
            .with_latency_ms(1000.0)],
    );
    let candidate = summarize_run(
        &candidate_run,
        &[TaskResult::scored("t", candidate_run.id.clone(), StrategyKind::MapReduce, "a", "a", 1.0)
            .with_latency_ms(4000.0)],
    );

    let comparison = compare_runs(&baseline, &candidate);
    assert_relative_eq!(comparison.avg_score_delta, 0.5);
    assert_relative_eq!(comparison.avg_latency_delta_ms, 3000.0);
    assert_eq!(comparison.tasks_completed_delta, 0);
    assert_relative_eq!(comparison.improvement_pct.unwrap(), 100.0);
}

#[test]
fn test_compare_runs_zero_baseline_has_no_improvement() {
    let run = BenchmarkRun::new(StrategyKind::Truncation, ExecutionMode::InProcess);
    let empty = summarize_run(&run, &[]);
    let comparison = compare_runs(&empty, &empty);

    assert_eq!(comparison.improvement_pct, None);
    assert_eq!(comparison.avg_score_delta, 0.0);
}
