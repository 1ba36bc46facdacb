use anyhow::{Context as _, Result};
use comfy_table::Cell;
use longctx_workflow::{dataset_stats, DatasetStats, JsonlTaskSource};
use std::path::Path;

use crate::context::Context;
use crate::output::{print_field, print_section, render_table, TableDisplay};

impl TableDisplay for DatasetStats {
    fn to_row(&self) -> Vec<Cell> {
        vec![
            Cell::new(self.dataset_filter.as_deref().unwrap_or("*")),
            Cell::new(self.filtered_count),
            Cell::new(self.total_rows),
        ]
    }

    fn display_single(&self) {
        print_section("Dataset");
        print_field("Filter", self.dataset_filter.as_deref().unwrap_or("(all)"));
        print_field("Tasks", &format!("{} of {} rows", self.filtered_count, self.total_rows));
        print_field(
            "Context length",
            &format!(
                "min {}, max {}, avg {:.0}",
                self.context_length.min, self.context_length.max, self.context_length.avg
            ),
        );

        let sections = [
            ("Task types", &self.task_types),
            ("Answer types", &self.answer_types),
        ];
        for (title, counts) in sections {
            if counts.is_empty() {
                continue;
            }
            print_section(title);
            let rows = counts.iter().map(|(name, count)| vec![Cell::new(name), Cell::new(count)]);
            println!("{}", render_table(&["Name", "Count"], rows));
        }
    }
}

pub async fn execute(ctx: &Context, tasks: &Path, dataset: Option<String>) -> Result<()> {
    let all = JsonlTaskSource::new(tasks)
        .read_all()
        .await
        .with_context(|| format!("Failed to load tasks from {}", tasks.display()))?;

    let stats = dataset_stats(&all, dataset.as_deref());
    ctx.output.write(&stats)
}
