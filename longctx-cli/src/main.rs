use anyhow::Result;
use clap::Parser;
use longctx_core::BenchConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;
mod context;
mod output;

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "longctx=debug" } else { "longctx=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let ctx = match Context::new(&cli) {
        Ok(ctx) => ctx,
        // Hooks run inside agent sessions and must not fail them.
        Err(err) if matches!(cli.command, Commands::Hook(_)) => {
            tracing::warn!("Falling back to default configuration: {:#}", err);
            Context::with_config(&cli, BenchConfig::default())
        }
        Err(err) => return Err(err),
    };

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(&ctx, args).await,
        Commands::Show { run_id } => commands::runs::show(&ctx, &run_id).await,
        Commands::Compare { baseline, candidate } => {
            commands::runs::compare(&ctx, &baseline, &candidate).await
        }
        Commands::ListRuns { limit } => commands::runs::list(&ctx, limit).await,
        Commands::Export { run_id, path, format } => {
            commands::export::execute(&ctx, &run_id, &path, format).await
        }
        Commands::Stats { tasks, dataset } => commands::stats::execute(&ctx, &tasks, dataset).await,
        Commands::Hook(hook) => commands::hook::execute(&ctx, hook).await,
    };

    if let Err(err) = result {
        ctx.output.error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}
