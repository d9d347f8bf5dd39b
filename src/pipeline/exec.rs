//! External-command abstraction: argument list + deadline in, typed result out.
//!
//! Both poppler tools are driven through [`run_tool`], so the subprocess
//! mechanics (capture, deadline, exit-status interpretation) live in exactly
//! one place and callers only map [`ExecError`] onto their own domain error.
//!
//! Each invocation is a single attempt: a tool that fails once will fail the
//! same way again, and the conversion policy is fail-fast throughout.

use std::ffi::OsStr;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Captured output of a successfully exited external tool.
#[derive(Debug)]
pub struct ToolOutput {
    /// Raw stdout bytes. May be binary (pdftoppm writes PNG here).
    pub stdout: Vec<u8>,
    /// Stderr decoded lossily as UTF-8, for diagnostics.
    pub stderr: String,
}

/// How an external tool invocation failed.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be spawned at all (binary missing, not executable).
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status (or was killed by a signal).
    #[error("'{program}' exited with status {status:?}: {stderr}")]
    NonZero {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The process did not exit within the deadline. It has been killed;
    /// any partial output is discarded.
    #[error("'{program}' timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },
}

/// Run an external tool to completion, enforcing a deadline.
///
/// Stdout and stderr are captured in full; stdin is closed. On timeout the
/// child is killed (`kill_on_drop`) and [`ExecError::TimedOut`] is returned
/// without any partial output.
pub async fn run_tool<I, S>(
    program: &str,
    args: I,
    timeout_secs: u64,
) -> Result<ToolOutput, ExecError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExecError::Spawn {
            program: program.to_string(),
            source: e,
        })?;

    // Dropping the future on timeout drops the child, which kills the
    // process thanks to kill_on_drop above.
    let output = match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ExecError::Spawn {
                program: program.to_string(),
                source: e,
            })
        }
        Err(_) => {
            return Err(ExecError::TimedOut {
                program: program.to_string(),
                secs: timeout_secs,
            })
        }
    };

    debug!(
        program,
        status = ?output.status.code(),
        stdout_bytes = output.stdout.len(),
        "external tool finished"
    );

    if !output.status.success() {
        return Err(ExecError::NonZero {
            program: program.to_string(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(ToolOutput {
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
