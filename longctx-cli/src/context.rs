//! CLI execution context

use anyhow::{Context as _, Result};
use longctx_core::{BenchConfig, RunId};
use longctx_storage::SqliteResultStore;
use longctx_workflow::STATE_DIR_ENV;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::output::OutputWriter;

/// Execution context for CLI commands
pub struct Context {
    pub config: BenchConfig,

    pub output: OutputWriter,
}

impl Context {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = crate::config::load(cli.config.as_deref())?;
        Ok(Self::with_config(cli, config))
    }

    /// Context over an already loaded configuration; `--db` still applies.
    pub fn with_config(cli: &Cli, mut config: BenchConfig) -> Self {
        if let Some(db) = &cli.db {
            config.db_path = db.clone();
        }

        Self {
            config,
            output: OutputWriter::new(cli.output, cli.no_color),
        }
    }

    pub async fn open_store(&self) -> Result<SqliteResultStore> {
        SqliteResultStore::open(&self.config.db_path)
            .await
            .with_context(|| format!("Failed to open database {}", self.config.db_path.display()))
    }

    /// State directory shared with agent sessions. The launcher's
    /// environment variable wins over configuration.
    pub fn state_dir(&self) -> PathBuf {
        std::env::var_os(STATE_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.lifecycle.state_dir.clone())
    }
}

pub fn parse_run_id(raw: &str) -> Result<RunId> {
    raw.parse().with_context(|| format!("Invalid run ID '{}'", raw))
}
