//! Command execution for running checks.
//!
//! Child processes are driven by tokio so stdout and stderr can be drained
//! concurrently. The hook itself is synchronous, so callers go through
//! [`Executor::execute_blocking`], which runs the future on a
//! current-thread runtime.

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Output from a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns combined stdout and stderr output.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }
}

/// Executor for running child processes.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `program` with `args` and blocks until it exits.
    ///
    /// Must not be called from within a tokio runtime: that case is
    /// rejected with [`Error::Internal`] instead of blocking the runtime.
    pub fn execute_blocking(
        &self,
        program: &Path,
        args: &[&str],
        options: ExecuteOptions,
    ) -> Result<CommandOutput> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(Error::Internal {
                message: "cannot run checks from within an async runtime".to_string(),
            });
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::io("create runtime", e))?;

        runtime.block_on(self.execute(program, args, options))
    }

    /// Runs `program` with `args`.
    pub async fn execute(
        &self,
        program: &Path,
        args: &[&str],
        options: ExecuteOptions,
    ) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(program = %program.display(), ?args, "Spawning command");

        let mut child = cmd.spawn().map_err(|e| Error::io("spawn command", e))?;
        let (exit_code, stdout, stderr) = self.wait_for_output(&mut child).await?;

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    /// Waits for the command to complete and captures output.
    async fn wait_for_output(
        &self,
        child: &mut tokio::process::Child,
    ) -> Result<(i32, String, String)> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_handle = tokio::spawn(async move {
            let mut output = String::new();
            if let Some(stdout) = stdout {
                let mut reader = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    output.push_str(&line);
                    output.push('\n');
                }
            }
            output
        });

        let stderr_handle = tokio::spawn(async move {
            let mut output = String::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    output.push_str(&line);
                    output.push('\n');
                }
            }
            output
        });

        let status = child.wait().await.map_err(|e| Error::io("wait for command", e))?;

        let stdout = stdout_handle.await.map_err(|e| Error::Internal {
            message: format!("stdout task failed: {e}"),
        })?;
        let stderr = stderr_handle.await.map_err(|e| Error::Internal {
            message: format!("stderr task failed: {e}"),
        })?;

        Ok((status.code().unwrap_or(1), stdout, stderr))
    }

    /// Locates a command in PATH.
    pub fn locate(command: &str) -> Result<PathBuf> {
        which::which(command).map_err(|_| Error::CommandNotFound {
            command: command.to_string(),
        })
    }
}
