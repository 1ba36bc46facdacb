use async_trait::async_trait;
use longctx_core::{ChunkSpec, Chunker, CoreError, EngineConfig, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;

use super::process::run_command;

const CONTEXT_NAME: &str = "context";

/// Chunker backed by the `rlm-rs` CLI.
///
/// Each split runs in a private scratch directory holding the context file,
/// the tool's database and the emitted chunk files.
#[derive(Debug, Clone)]
pub struct RlmChunker {
    binary: String,
    step_timeout: Duration,
}

impl RlmChunker {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            step_timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.chunker_binary.clone())
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    async fn step(&self, step: &str, args: &[&str], db_path: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(step).args(args).arg("--db-path").arg(db_path);

        tracing::debug!("Running chunker step {}", step);
        run_command(cmd, None, self.step_timeout, &format!("{} {}", self.binary, step)).await?;
        Ok(())
    }
}

#[async_trait]
impl Chunker for RlmChunker {
    async fn split(&self, context: &str, spec: &ChunkSpec) -> Result<Vec<String>> {
        let scratch = tempfile::tempdir()?;
        let context_file = scratch.path().join("context.txt");
        let db_path = scratch.path().join("rlm.db");
        let chunks_dir = scratch.path().join("chunks");

        fs::write(&context_file, context).await?;
        fs::create_dir_all(&chunks_dir).await?;

        let chunk_size = spec.target_size.to_string();
        let context_arg = context_file.to_string_lossy().into_owned();
        let out_dir_arg = chunks_dir.to_string_lossy().into_owned();

        self.step("init", &[], &db_path).await?;
        self.step(
            "load",
            &[
                context_arg.as_str(),
                "--name",
                CONTEXT_NAME,
                "--chunker",
                spec.mode.as_str(),
                "--chunk-size",
                chunk_size.as_str(),
            ],
            &db_path,
        )
        .await?;
        self.step("write-chunks", &[CONTEXT_NAME, "--out-dir", out_dir_arg.as_str()], &db_path)
            .await?;

        let chunks = read_chunk_dir(&chunks_dir).await?;
        tracing::info!(
            "Split {} chars into {} chunks ({} mode, target {})",
            context.chars().count(),
            chunks.len(),
            spec.mode,
            spec.target_size
        );
        Ok(chunks)
    }
}

/// Read every `*.txt` file in `dir`, ordered by file name. Empty files are skipped.
pub async fn read_chunk_dir(dir: &Path) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        CoreError::Io(format!("Cannot read chunk directory {}: {}", dir.display(), e))
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut chunks = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path).await?;
        if !text.is_empty() {
            chunks.push(text);
        }
    }
    Ok(chunks)
}
