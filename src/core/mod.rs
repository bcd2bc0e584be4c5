//! Core functionality for precommit-hook.
//!
//! This module contains the main components:
//! - [`hook`]: The hook controller
//! - [`runner`]: Check execution engine
//! - [`logger`]: Hook output formatting
//! - [`error`]: Error types and result handling
//! - [`git`]: Git repository operations

pub mod error;
pub mod executor;
pub mod git;
pub mod hook;
pub mod logger;
pub mod runner;
