//! Command-line interface for precommit-hook.
//!
//! This module provides the `precommit` CLI with subcommands for:
//! - `run`: Run the configured scripts (the default, called by the git hook)
//! - `install`: Install the git hook
//! - `uninstall`: Remove the git hook
//! - `config`: Show the resolved configuration

mod commands;

use crate::core::error::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Run package scripts before every git commit.
#[derive(Debug, Parser)]
#[command(
    name = "precommit",
    author,
    version,
    about = "Run package scripts before every git commit",
    long_about = r#"
precommit runs the scripts listed in package.json before git records a
commit. If one of them fails, the commit is aborted.

Quick start:
  precommit install   # Install git hook
  # Add to package.json:
  #   "pre-commit": ["lint", "test"]

Settings can also live in .pre-commit.json, which wins over package.json.
Skip the hook for a single commit with `git commit -n`.
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the configured scripts.
    #[command(visible_alias = "r")]
    Run {
        /// Report failures but exit with status 0.
        #[arg(long, env = "PRECOMMIT_IGNORE_STATUS")]
        ignore_status: bool,

        /// Suppress hook output.
        #[arg(short, long)]
        silent: bool,
    },

    /// Install the git pre-commit hook.
    Install,

    /// Remove the git pre-commit hook.
    Uninstall,

    /// Show the resolved configuration as JSON.
    Config,
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    setup_color(cli.color);

    // Without a subcommand, behave like `precommit run`.
    match cli.command {
        Some(Commands::Run {
            ignore_status,
            silent,
        }) => commands::run(ignore_status, silent, cli.color),
        Some(Commands::Install) => commands::install(),
        Some(Commands::Uninstall) => commands::uninstall(),
        Some(Commands::Config) => commands::config(cli.color),
        None => commands::run(false, false, cli.color),
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {},
    }
}

impl ColorChoice {
    /// Returns the forced color setting, if any.
    #[must_use]
    pub const fn forced(self) -> Option<bool> {
        match self {
            Self::Always => Some(true),
            Self::Never => Some(false),
            Self::Auto => None,
        }
    }
}
