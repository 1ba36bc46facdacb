use longctx_core::{CoreError, Result};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Run a command to completion and return its stdout.
///
/// `input` is written to stdin and stdin is closed afterwards. The child is
/// killed if the deadline passes before it exits.
pub async fn run_command(
    mut command: Command,
    input: Option<String>,
    timeout: Duration,
    operation: &str,
) -> Result<String> {
    command
        .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| CoreError::ExternalCall(format!("Failed to spawn {}: {}", operation, e)))?;

    let stdin = child.stdin.take();
    let feed = async move {
        if let (Some(mut stdin), Some(input)) = (stdin, input) {
            stdin.write_all(input.as_bytes()).await?;
            // Dropping stdin sends EOF.
            drop(stdin);
        }
        Ok::<_, std::io::Error>(())
    };
    // Stdin is fed while stdout and stderr drain, so a chatty child never fills a pipe.
    let io = async move {
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        match fed {
            Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(CoreError::ExternalCall(format!(
                "Failed to write to {}: {}",
                operation, e
            ))),
            _ => Ok(output),
        }
    };

    let output = match tokio::time::timeout(timeout, io).await {
        Ok(output) => output?,
        Err(_) => {
            tracing::warn!("{} did not finish within {:?}", operation, timeout);
            return Err(CoreError::Timeout {
                operation: operation.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CoreError::ExternalCall(format!(
            "{} failed ({}): {}",
            operation,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
