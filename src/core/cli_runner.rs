//! External command runner.
//!
//! Used where a backend's credential can only be minted by a vendor CLI
//! (currently `gcloud` for Application Default Credentials).

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{BarError, Result};

/// Deadline for a vendor CLI invocation.
pub const CLI_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `program` to completion, capturing both pipes.
///
/// The child is killed if the deadline passes first.
///
/// # Errors
/// [`BarError::CommandNotFound`] when `program` is not on `PATH`, and
/// [`BarError::CommandFailed`] when it cannot be spawned or times out.
pub async fn run_command(program: &str, args: &[&str], deadline: Duration) -> Result<Output> {
    let failed = |reason: String| BarError::CommandFailed {
        program: program.to_string(),
        reason,
    };

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BarError::CommandNotFound(program.to_string()),
            _ => failed(e.to_string()),
        })?;

    tracing::debug!(program, ?args, "running external command");
    match timeout(deadline, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(failed(e.to_string())),
        Err(_) => Err(failed(format!("timed out after {}s", deadline.as_secs()))),
    }
}

/// Run `program` and return its trimmed stdout.
///
/// # Errors
/// Everything [`run_command`] returns, plus [`BarError::CommandFailed`] for a
/// non-zero exit or empty output.
pub async fn run_text_command(program: &str, args: &[&str], deadline: Duration) -> Result<String> {
    let output = run_command(program, args, deadline).await?;
    let failed = |reason: String| BarError::CommandFailed {
        program: program.to_string(),
        reason,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        return Err(failed(format!("exit code {code}: {}", stderr.trim())));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        return Err(failed("empty output".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_command_not_found() {
        let err = run_command("opencodebar-no-such-binary", &[], CLI_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, BarError::CommandNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn text_command_trims_stdout() {
        let out = tokio_test::assert_ok!(
            run_text_command("echo", &["  ya29.token  "], CLI_TIMEOUT).await
        );
        assert_eq!(out, "ya29.token");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let err = run_command("sleep", &["5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, BarError::CommandFailed { reason, .. } if reason.contains("timed out")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let err = tokio_test::assert_err!(run_text_command("false", &[], CLI_TIMEOUT).await);
        assert!(matches!(err, BarError::CommandFailed { .. }));
    }
}
