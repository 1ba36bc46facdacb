use longctx_core::{CoreError, Result, TaskResult};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One pretty-printed array.
    #[default]
    Json,
    /// One object per line.
    Jsonl,
    /// Header row plus one row per result.
    Csv,
    Yaml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Jsonl => "jsonl",
            ExportFormat::Csv => "csv",
            ExportFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "jsonl" => Ok(ExportFormat::Jsonl),
            "csv" => Ok(ExportFormat::Csv),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(CoreError::Validation(format!("Unsupported export format: {}", other))),
        }
    }
}

/// Render results in the given format.
pub fn render_results(results: &[TaskResult], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(results)?),
        ExportFormat::Jsonl => {
            let mut out = String::new();
            for result in results {
                out.push_str(&serde_json::to_string(result)?);
                out.push('\n');
            }
            Ok(out)
        }
        ExportFormat::Csv => render_csv(results),
        ExportFormat::Yaml => {
            serde_yaml::to_string(results).map_err(|e| CoreError::Serialization(e.to_string()))
        }
    }
}

fn render_csv(results: &[TaskResult]) -> Result<String> {
    let csv_error = |e: csv::Error| CoreError::Serialization(e.to_string());

    let mut writer = csv::Writer::from_writer(Vec::new());
    for result in results {
        writer.serialize(result).map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Write results to `path`, creating parent directories. Returns the number written.
pub async fn export_results(
    results: &[TaskResult],
    path: &Path,
    format: ExportFormat,
) -> Result<usize> {
    let rendered = render_results(results, format)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, rendered).await?;

    tracing::info!("Exported {} results to {} ({})", results.len(), path.display(), format);
    Ok(results.len())
}
