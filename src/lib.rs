//! # precommit-hook
//!
//! Run package scripts as a git pre-commit hook.
//!
//! The hook reads its settings from `package.json` (and an optional
//! `.pre-commit.json` override file), runs the configured scripts one after
//! the other and aborts the commit when one of them fails.
//!
//! ## Features
//!
//! - **Flexible configuration**: run lists as strings or arrays, flag keys,
//!   and a fallback to the `test` script
//! - **Fail fast**: the first failing script stops the run
//! - **Readable output**: every line tagged with `pre-commit:`, optionally
//!   colorized or silenced
//!
//! ## Example
//!
//! ```rust,no_run
//! use precommit_hook::{Hook, HookOptions};
//!
//! let mut hook = Hook::new(
//!     |code, _lines| std::process::exit(code),
//!     HookOptions::default(),
//! );
//! hook.run();
//! ```

#![doc(html_root_url = "https://docs.rs/precommit-hook/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cli;
pub mod config;
pub mod core;

// Re-export main types for convenience
pub use config::{resolve, ResolvedConfig};
pub use core::error::{Error, Result};
pub use core::git::{GitRepo, StagedChanges};
pub use core::hook::{Hook, HookOptions};
pub use core::logger::{Logger, Message};
pub use core::runner::{ExecutionResult, RunOutcome, ScriptRunner};
