//! The `run` command

use anyhow::{Context as _, Result};
use colored::Colorize;
use longctx_core::{BenchmarkRun, ExecutionMode, ResultStore, TaskFilter, TaskProvider};
use longctx_metrics::summarize_run;
use longctx_workflow::{
    build_strategy, BenchmarkRunner, CliAgentLauncher, CliAnsweringEngine, JsonlTaskSource,
    LifecycleCoordinator, RlmChunker, RunProgress, TaskStateStore,
};
use serde_json::json;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::context::Context;
use crate::output::colored_score;

fn progress_line(p: &RunProgress<'_>) -> String {
    let position = format!("[{}/{}]", p.position, p.total);
    match p.result {
        Some(result) if result.is_success() => format!(
            "{} {}: score {} ({:.0}ms)",
            position,
            p.task_id,
            colored_score(result.score()),
            result.latency_ms()
        ),
        Some(result) => format!(
            "{} {}: {} {}",
            position,
            p.task_id,
            "failed".red(),
            result.error().unwrap_or_default()
        ),
        None => format!("{} {}: {}", position, p.task_id, p.outcome.yellow()),
    }
}

pub async fn execute(ctx: &Context, args: RunArgs) -> Result<()> {
    let mut filter = TaskFilter::default().with_min_context_length(args.min_context);
    filter = if args.dataset.is_empty() {
        filter.any_dataset()
    } else {
        filter.with_dataset(args.dataset.clone())
    };
    if let Some(limit) = args.limit {
        filter = filter.with_limit(limit);
    }

    let source = JsonlTaskSource::new(&args.tasks);
    let tasks = source
        .load_tasks(&filter)
        .await
        .with_context(|| format!("Failed to load tasks from {}", args.tasks.display()))?;

    if tasks.is_empty() {
        ctx.output.warning("No tasks match the filter; nothing to run.");
        return Ok(());
    }

    let store = Arc::new(ctx.open_store().await?);
    let runner = BenchmarkRunner::new(store.clone());

    let mut run = BenchmarkRun::new(args.strategy, args.mode)
        .with_metadata("dataset", json!(args.dataset))
        .with_metadata("min_context_length", json!(args.min_context))
        .with_metadata("limit", json!(args.limit))
        .with_metadata("tasks_file", json!(args.tasks.display().to_string()));

    ctx.output.info(&format!(
        "Run {}: {} tasks, strategy {}, mode {}",
        run.id,
        tasks.len(),
        args.strategy,
        args.mode
    ));

    let pb = ctx.output.progress_bar(tasks.len() as u64, "tasks");
    let on_progress = |p: RunProgress<'_>| match &pb {
        Some(pb) => {
            pb.println(progress_line(&p));
            pb.set_position(p.position as u64);
        }
        None => tracing::info!("{}", progress_line(&p)),
    };

    let config = &ctx.config;
    let report = match args.mode {
        ExecutionMode::InProcess => {
            let strategy = build_strategy(
                args.strategy,
                &config.strategy_config(),
                Arc::new(CliAnsweringEngine::from_config(&config.engine)),
                Arc::new(RlmChunker::from_config(&config.engine)),
            );
            runner
                .run_in_process(strategy.as_ref(), &mut run, &tasks, on_progress)
                .await
        }
        ExecutionMode::OutOfProcess => {
            let coordinator = LifecycleCoordinator::new(
                TaskStateStore::new(ctx.state_dir()),
                Arc::new(CliAgentLauncher::from_config(&config.engine, &config.lifecycle)),
                args.strategy,
                config.lifecycle.clone(),
            );
            runner
                .run_out_of_process(&coordinator, &mut run, &tasks, on_progress)
                .await
        }
    };

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    if report.abandoned + report.timed_out > 0 {
        ctx.output.warning(&format!(
            "{} task(s) abandoned, {} timed out",
            report.abandoned, report.timed_out
        ));
    }

    let summary = match store.get_run_summary(&run.id).await {
        Ok(Some(summary)) => summary,
        Ok(None) => summarize_run(&run, &report.results),
        Err(err) => {
            tracing::warn!("Could not read summary for run {}: {}", run.id, err);
            summarize_run(&run, &report.results)
        }
    };

    ctx.output.write(&summary)?;
    ctx.output.success(&format!("Run {} finished", run.id));
    Ok(())
}
