//! Check runner for executing pre-commit checks.
//!
//! Checks are package scripts, run one after the other through a
//! [`ScriptRunner`]. The first failing script stops the run.

use crate::core::error::Result;
use crate::core::executor::{ExecuteOptions, Executor};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Script runner binary.
pub const NPM: &str = "npm";

/// Number of output lines kept in a failure report.
pub const OUTPUT_TAIL_LINES: usize = 20;

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Name of the script.
    pub name: String,
    /// Exit status of the script.
    pub exit_code: i32,
    /// Captured stdout and stderr.
    pub output: String,
}

impl ExecutionResult {
    /// Creates a result.
    pub fn new(name: impl Into<String>, exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exit_code,
            output: output.into(),
        }
    }

    /// Returns true if the script exited with status 0.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the last `count` non-blank output lines.
    #[must_use]
    pub fn output_tail(&self, count: usize) -> Vec<&str> {
        let lines: Vec<&str> = self
            .output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        lines[lines.len().saturating_sub(count)..].to_vec()
    }
}

/// Runs a named check through the host script runner.
#[cfg_attr(test, mockall::automock)]
pub trait ScriptRunner {
    /// Runs the script and waits for it to finish.
    fn run_script(&self, name: &str) -> Result<ExecutionResult>;
}

/// Runs checks as `npm run <name> --silent` in the project root.
#[derive(Debug)]
pub struct NpmScriptRunner {
    root: PathBuf,
    executor: Executor,
}

impl NpmScriptRunner {
    /// Creates a runner for the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            executor: Executor::new(),
        }
    }
}

impl ScriptRunner for NpmScriptRunner {
    fn run_script(&self, name: &str) -> Result<ExecutionResult> {
        let npm = Executor::locate(NPM)?;
        let output = self.executor.execute_blocking(
            &npm,
            &["run", name, "--silent"],
            ExecuteOptions::default().cwd(&self.root),
        )?;

        Ok(ExecutionResult::new(
            name,
            output.exit_code,
            output.combined_output(),
        ))
    }
}

/// Result of running all checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every check exited with status 0.
    Passed {
        /// Results in run order.
        results: Vec<ExecutionResult>,
    },
    /// A check failed; later checks did not run.
    Failed {
        /// 1-based position of the failed check.
        position: usize,
        /// Number of configured checks.
        total: usize,
        /// The failed check.
        result: ExecutionResult,
    },
}

impl RunOutcome {
    /// Returns true if all checks passed.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Describes a failure for the log formatter. Empty on success.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        let Self::Failed {
            position,
            total,
            result,
        } = self
        else {
            return Vec::new();
        };

        let mut lines = vec![
            format!(
                "The `{}` check ({position}/{total}) did not pass:",
                result.name
            ),
            format!("the script returned exit code ({}).", result.exit_code),
            String::new(),
            "Fix the problems, or skip the hook (this commits broken code) with:".to_string(),
            String::new(),
            "  git commit -n (or --no-verify)".to_string(),
        ];

        let tail = result.output_tail(OUTPUT_TAIL_LINES);
        if !tail.is_empty() {
            lines.push(String::new());
            lines.push("Output:".to_string());
            lines.extend(tail.iter().map(|line| format!("  {line}")));
        }

        lines
    }
}

/// Runs `names` in order, stopping at the first failure.
pub fn run_checks(
    scripts: &dyn ScriptRunner,
    names: &[String],
    progress: bool,
) -> Result<RunOutcome> {
    let total = names.len();
    let mut results = Vec::with_capacity(total);

    for (index, name) in names.iter().enumerate() {
        let spinner = progress.then(|| spinner(name));
        let result = scripts.run_script(name);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        let result = result?;

        tracing::debug!(
            check = %name,
            exit_code = result.exit_code,
            "Check finished"
        );

        if !result.passed() {
            return Ok(RunOutcome::Failed {
                position: index + 1,
                total,
                result,
            });
        }

        results.push(result);
    }

    Ok(RunOutcome::Passed { results })
}

fn spinner(name: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .ok()
            .unwrap_or_else(ProgressStyle::default_spinner),
    );
    pb.set_message(format!("Running {name}..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
