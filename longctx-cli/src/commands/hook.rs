//! Agent-side hooks. The agent host runs these inside its session.
//!
//! Hook failures are logged and swallowed so a broken hand-off never takes
//! the agent session down with it.

use anyhow::Result;
use longctx_workflow::{
    accept_pending, complete_in_progress, AgentPromptConfig, SessionReport, TaskStateStore,
};
use tokio::io::AsyncReadExt;

use crate::cli::HookCommand;
use crate::context::Context;

pub async fn execute(ctx: &Context, hook: HookCommand) -> Result<()> {
    let store = TaskStateStore::new(ctx.state_dir());

    match hook {
        HookCommand::SessionStart => {
            let config = AgentPromptConfig {
                max_context_chars: ctx.config.truncation.max_context_chars,
            };
            match accept_pending(&store, &config).await {
                Ok(Some(prompt)) => println!("{}", prompt),
                Ok(None) => tracing::debug!("No pending task in {}", store.dir().display()),
                Err(err) => tracing::error!("Session-start hook failed: {}", err),
            }
        }
        HookCommand::Stop => {
            let mut raw = String::new();
            if let Err(err) = tokio::io::stdin().read_to_string(&mut raw).await {
                tracing::warn!("Could not read session payload: {}", err);
            }
            let report = SessionReport::from_json(&raw);

            match complete_in_progress(&store, &report).await {
                Ok(Some(result)) => tracing::info!("Recorded answer for task {}", result.task_id()),
                Ok(None) => tracing::debug!("No task in progress in {}", store.dir().display()),
                Err(err) => tracing::error!("Stop hook failed: {}", err),
            }
        }
    }
    Ok(())
}
