//! Command-line surface

use clap::{Args, Parser, Subcommand};
use longctx_core::{ExecutionMode, StrategyKind, DEFAULT_DATASET, DEFAULT_MIN_CONTEXT_LENGTH};
use longctx_storage::ExportFormat;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Long-context benchmark harness
#[derive(Debug, Parser)]
#[command(name = "longctx", version, about)]
pub struct Cli {
    /// SQLite database for runs and results
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Extra configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the benchmark over a task file
    Run(RunArgs),

    /// Show one run with its results
    Show {
        run_id: String,
    },

    /// Compare two runs
    Compare {
        /// Baseline run ID
        baseline: String,
        /// Candidate run ID
        candidate: String,
    },

    /// List recent runs
    ListRuns {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Export the results of a run
    Export {
        run_id: String,
        /// Destination file
        #[arg(value_name = "OUTPUT")]
        path: PathBuf,
        /// json, jsonl, csv or yaml
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
    },

    /// Describe the tasks in a dataset file
    Stats {
        #[arg(long)]
        tasks: PathBuf,
        #[arg(long)]
        dataset: Option<String>,
    },

    /// Agent session hooks
    #[command(subcommand)]
    Hook(HookCommand),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// truncation or map_reduce
    #[arg(short, long)]
    pub strategy: StrategyKind,

    /// in_process or out_of_process
    #[arg(short, long, default_value = "in_process")]
    pub mode: ExecutionMode,

    /// JSONL task file
    #[arg(long)]
    pub tasks: PathBuf,

    /// Dataset to keep; empty keeps every dataset
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: String,

    /// Minimum context length in characters
    #[arg(long, default_value_t = DEFAULT_MIN_CONTEXT_LENGTH)]
    pub min_context: usize,

    /// Maximum number of tasks
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum HookCommand {
    /// Pick up the pending task and print its prompt
    SessionStart,
    /// Score the session's answer (session JSON on stdin)
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "longctx",
            "run",
            "--strategy",
            "rlm_rs",
            "--mode",
            "hooks",
            "--tasks",
            "t.jsonl",
            "--limit",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.strategy, StrategyKind::MapReduce);
                assert_eq!(args.mode, ExecutionMode::OutOfProcess);
                assert_eq!(args.dataset, DEFAULT_DATASET);
                assert_eq!(args.min_context, DEFAULT_MIN_CONTEXT_LENGTH);
                assert_eq!(args.limit, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_format() {
        let cli = Cli::try_parse_from([
            "longctx", "-o", "json", "export", "abc", "out.yaml", "-f", "yaml",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Export { format: ExportFormat::Yaml, .. }));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let parsed = Cli::try_parse_from(["longctx", "run", "--strategy", "magic", "--tasks", "t"]);
        assert!(parsed.is_err());
    }
}
