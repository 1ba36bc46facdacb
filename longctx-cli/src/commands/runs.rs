//! Run inspection commands

use anyhow::{anyhow, Result};
use comfy_table::Cell;
use longctx_core::{BenchmarkRun, ResultStore, RunComparison, RunSummary, TaskResult};
use longctx_metrics::compare_runs;
use serde::Serialize;

use crate::context::{parse_run_id, Context};
use crate::output::{
    colored_delta, colored_score, delta_cell, format_timestamp, print_field, print_section,
    render_table, score_color, TableDisplay,
};

impl TableDisplay for RunSummary {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.run_id),
            Cell::new(self.strategy),
            Cell::new(self.mode),
            Cell::new(self.tasks_total()),
            Cell::new(format!("{:.4}", self.avg_score)).fg(score_color(self.avg_score)),
        ]
    }

    fn display_single(&self) {
        print_section(&format!("Run {}", self.run_id));
        print_field("Strategy", self.strategy.as_str());
        print_field("Mode", self.mode.as_str());
        print_field(
            "Tasks",
            &format!(
                "{} ({} completed, {} failed)",
                self.tasks_total(),
                self.tasks_completed,
                self.tasks_failed
            ),
        );
        print_field("Avg score", &colored_score(self.avg_score).to_string());
        print_field("Score range", &format!("{:.4} - {:.4}", self.min_score, self.max_score));
        print_field("Total latency", &format!("{:.0}ms", self.total_latency_ms));
        print_field("Avg latency", &format!("{:.0}ms", self.avg_latency_ms));
    }
}

impl TableDisplay for BenchmarkRun {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.id),
            Cell::new(format_timestamp(&self.timestamp)),
            Cell::new(self.strategy),
            Cell::new(self.mode),
            Cell::new(format!("{}/{}", self.tasks_completed, self.tasks_total)),
            Cell::new(format!("{:.4}", self.avg_score)).fg(score_color(self.avg_score)),
        ]
    }

    fn display_single(&self) {
        print_section(&format!("Run {}", self.id));
        print_field("Timestamp", &format_timestamp(&self.timestamp));
        print_field("Strategy", self.strategy.as_str());
        print_field("Mode", self.mode.as_str());
        print_field("Avg score", &colored_score(self.avg_score).to_string());
    }
}

pub(crate) fn result_row(result: &TaskResult) -> Vec<Cell> {
    vec![
        Cell::new(result.task_id()),
        Cell::new(format!("{:.4}", result.score())).fg(score_color(result.score())),
        Cell::new(result.expected_answer()),
        Cell::new(result.actual_answer()),
        Cell::new(format!("{:.0}", result.latency_ms())),
        Cell::new(result.tokens_used()),
        Cell::new(result.error().unwrap_or("-")),
    ]
}

const RESULT_HEADERS: [&str; 7] = [
    "Task",
    "Score",
    "Expected",
    "Actual",
    "Latency (ms)",
    "Tokens",
    "Error",
];

/// A run with everything recorded for it.
#[derive(Debug, Serialize)]
struct RunDetail {
    run: BenchmarkRun,
    summary: RunSummary,
    results: Vec<TaskResult>,
}

impl TableDisplay for RunDetail {
    fn to_row(&self) -> Vec<Cell> {
        self.summary.to_row()
    }

    fn display_single(&self) {
        self.summary.display_single();
        print_field("Timestamp", &format_timestamp(&self.run.timestamp));
        if let Some(meta) = self.run.metadata.as_object().filter(|m| !m.is_empty()) {
            for (key, value) in meta {
                print_field(key, &value.to_string());
            }
        }
        if !self.results.is_empty() {
            print_section("Results");
            println!("{}", render_table(&RESULT_HEADERS, self.results.iter().map(result_row)));
        }
    }
}

pub async fn show(ctx: &Context, raw_id: &str) -> Result<()> {
    let run_id = parse_run_id(raw_id)?;
    let store = ctx.open_store().await?;

    let run = store
        .get_run(&run_id)
        .await?
        .ok_or_else(|| anyhow!("Run {} not found", run_id))?;
    let summary = store
        .get_run_summary(&run_id)
        .await?
        .ok_or_else(|| anyhow!("Run {} not found", run_id))?;
    let results = store.get_results(&run_id).await?;

    ctx.output.write(&RunDetail { run, summary, results })
}

pub async fn list(ctx: &Context, limit: usize) -> Result<()> {
    let store = ctx.open_store().await?;
    let runs = store.list_runs(limit).await?;
    ctx.output
        .write_list(&runs, &["ID", "Timestamp", "Strategy", "Mode", "Tasks", "Avg Score"])
}

impl TableDisplay for RunComparison {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(&self.baseline.run_id),
            Cell::new(&self.candidate.run_id),
            Cell::new(format!("{:+.4}", self.avg_score_delta)),
        ]
    }

    fn display_single(&self) {
        let (a, b) = (&self.baseline, &self.candidate);
        print_section(&format!("Comparison {} vs {}", a.run_id, b.run_id));

        let rows = vec![
            vec![
                Cell::new("Strategy"),
                Cell::new(a.strategy),
                Cell::new(b.strategy),
                Cell::new(""),
            ],
            vec![
                Cell::new("Avg score"),
                Cell::new(format!("{:.4}", a.avg_score)),
                Cell::new(format!("{:.4}", b.avg_score)),
                delta_cell(self.avg_score_delta, 4, true),
            ],
            vec![
                Cell::new("Min score"),
                Cell::new(format!("{:.4}", a.min_score)),
                Cell::new(format!("{:.4}", b.min_score)),
                delta_cell(self.min_score_delta, 4, true),
            ],
            vec![
                Cell::new("Max score"),
                Cell::new(format!("{:.4}", a.max_score)),
                Cell::new(format!("{:.4}", b.max_score)),
                delta_cell(self.max_score_delta, 4, true),
            ],
            vec![
                Cell::new("Completed"),
                Cell::new(a.tasks_completed),
                Cell::new(b.tasks_completed),
                delta_cell(self.tasks_completed_delta as f64, 0, true),
            ],
            vec![
                Cell::new("Failed"),
                Cell::new(a.tasks_failed),
                Cell::new(b.tasks_failed),
                delta_cell(self.tasks_failed_delta as f64, 0, false),
            ],
            vec![
                Cell::new("Avg latency (ms)"),
                Cell::new(format!("{:.0}", a.avg_latency_ms)),
                Cell::new(format!("{:.0}", b.avg_latency_ms)),
                delta_cell(self.avg_latency_delta_ms, 0, false),
            ],
        ];
        let headers = ["Metric", "Baseline", "Candidate", "Diff"];
        println!("{}", render_table(&headers, rows.into_iter()));

        match self.improvement_pct {
            Some(pct) => println!("\nScore improvement: {}%", colored_delta(pct, 1, true)),
            None => println!("\nScore improvement: n/a (baseline average is zero)"),
        }
    }
}

pub async fn compare(ctx: &Context, baseline: &str, candidate: &str) -> Result<()> {
    let store = ctx.open_store().await?;

    let mut summaries = Vec::with_capacity(2);
    for raw in [baseline, candidate] {
        let run_id = parse_run_id(raw)?;
        let summary = store
            .get_run_summary(&run_id)
            .await?
            .ok_or_else(|| anyhow!("Run {} not found", run_id))?;
        summaries.push(summary);
    }

    let comparison = compare_runs(&summaries[0], &summaries[1]);
    ctx.output.write(&comparison)
}
