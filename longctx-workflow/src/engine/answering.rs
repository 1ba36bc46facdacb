use async_trait::async_trait;
use longctx_core::{AnswerRequest, AnsweringEngine, EngineConfig, Result};
use tokio::process::Command;

use super::process::run_command;

/// Answering engine backed by a non-interactive CLI.
///
/// Invoked as `<binary> --print --model <model> --output-format <json|text>`
/// with the prompt on stdin.
#[derive(Debug, Clone)]
pub struct CliAnsweringEngine {
    binary: String,
}

impl CliAnsweringEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.binary.clone())
    }

    fn command(&self, request: &AnswerRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--print")
            .arg("--model")
            .arg(&request.model)
            .arg("--output-format")
            .arg(request.format.as_str());
        cmd
    }
}

#[async_trait]
impl AnsweringEngine for CliAnsweringEngine {
    async fn answer(&self, request: &AnswerRequest) -> Result<String> {
        tracing::debug!(
            model = %request.model,
            format = request.format.as_str(),
            prompt_chars = request.prompt.len(),
            "Calling answering engine"
        );

        run_command(
            self.command(request),
            Some(request.prompt.clone()),
            request.timeout,
            &self.binary,
        )
        .await
    }
}
