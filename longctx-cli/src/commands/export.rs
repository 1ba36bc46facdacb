use anyhow::{bail, Result};
use longctx_core::ResultStore;
use longctx_storage::{export_results, ExportFormat};
use std::path::Path;

use crate::context::{parse_run_id, Context};

pub async fn execute(ctx: &Context, raw_id: &str, path: &Path, format: ExportFormat) -> Result<()> {
    let run_id = parse_run_id(raw_id)?;
    let store = ctx.open_store().await?;

    if store.get_run(&run_id).await?.is_none() {
        bail!("Run {} not found", run_id);
    }

    let results = store.get_results(&run_id).await?;
    if results.is_empty() {
        ctx.output.warning(&format!("Run {} has no results", run_id));
    }

    let written = export_results(&results, path, format).await?;
    ctx.output.success(&format!(
        "Exported {} result(s) to {} ({})",
        written,
        path.display(),
        format
    ));
    Ok(())
}
