use async_trait::async_trait;
use longctx_core::{AgentLauncher, EngineConfig, LifecycleConfig, Result};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

use super::process::run_command;

/// Environment variable through which the agent's hooks find the state directory.
pub const STATE_DIR_ENV: &str = "LONGCTX_STATE_DIR";

/// Launches one non-interactive agent session per task.
///
/// The session itself only receives a trigger prompt. The agent's
/// session-start hook injects the task from the state directory.
#[derive(Debug, Clone)]
pub struct CliAgentLauncher {
    binary: String,
    model: String,
    state_dir: PathBuf,
    timeout: Duration,
}

impl CliAgentLauncher {
    pub fn new(
        binary: impl Into<String>,
        model: impl Into<String>,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            state_dir: state_dir.into(),
            timeout: Duration::from_secs(600),
        }
    }

    pub fn from_config(engine: &EngineConfig, lifecycle: &LifecycleConfig) -> Self {
        Self::new(engine.binary.clone(), engine.model.clone(), lifecycle.state_dir.clone())
            .with_timeout(lifecycle.session_timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AgentLauncher for CliAgentLauncher {
    async fn launch(&self, prompt: &str) -> Result<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--print")
            .arg("--model")
            .arg(&self.model)
            .arg("--output-format")
            .arg("json")
            .env(STATE_DIR_ENV, &self.state_dir);

        tracing::debug!("Launching agent session with state dir {}", self.state_dir.display());
        run_command(cmd, Some(prompt.to_string()), self.timeout, "agent session").await?;
        Ok(())
    }
}
