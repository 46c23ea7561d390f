// src/exec/command.rs

//! External command execution for tasks that delegate to a CLI tool.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::errors::TaskError;

/// Build a shell command appropriate for the platform.
fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` through the platform shell in `cwd` and wait for it.
///
/// A spawn failure or a non-zero exit becomes [`TaskError::Command`] carrying
/// the tail of the command's stderr.
pub fn run_shell(cmd: &str, cwd: &Path) -> Result<(), TaskError> {
    info!(cmd = %cmd, "running external command");

    let output = shell(cmd)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| TaskError::Command {
            cmd: cmd.to_string(),
            message: format!("failed to spawn: {e}"),
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!(cmd = %cmd, "stderr: {}", line);
    }

    if output.status.success() {
        return Ok(());
    }

    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
    let tail: Vec<&str> = tail.into_iter().rev().collect();

    Err(TaskError::Command {
        cmd: cmd.to_string(),
        message: format!("exit status {code}: {}", tail.join("\n")),
    })
}
