//! Error types for precommit-hook.
//!
//! Every failure the hook can hit ends up here. Nothing propagates past the
//! [`Hook`](crate::core::hook::Hook) boundary: errors are rendered with
//! [`Error::report_lines`] and handed to the log formatter instead.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in precommit-hook.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// A configuration file exists but could not be read.
    #[error("Failed to read {}", path.display())]
    ConfigRead {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not a valid JSON object.
    #[error("Failed to parse {}: {message}", path.display())]
    ConfigParse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // =========================================================================
    // Git errors
    // =========================================================================
    /// Not in a Git repository.
    #[error("Not in a Git repository")]
    NotGitRepo,

    /// Git operation failed.
    #[error("Git operation failed: {operation} - {message}")]
    GitOperation {
        /// Name of the operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    // =========================================================================
    // Check execution errors
    // =========================================================================
    /// Command not found.
    #[error("Command not found: {command}")]
    CommandNotFound {
        /// The command that wasn't found.
        command: String,
    },

    // =========================================================================
    // Hook errors
    // =========================================================================
    /// Failed to install or remove the hook script.
    #[error("Failed to install Git hook: {message}")]
    HookInstall {
        /// Error message.
        message: String,
    },

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration read error.
    pub fn config_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new configuration parse error.
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new Git operation error.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if the configuration could not be loaded.
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigRead { .. } | Self::ConfigParse { .. })
    }

    /// Renders the diagnostic block shown to the user through the log formatter.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            Self::ConfigRead { path, source } => vec![
                format!("Could not read `{}`:", path.display()),
                String::new(),
                source.to_string(),
                String::new(),
                "Fix the file permissions and commit again.".to_string(),
            ],
            Self::ConfigParse { path, message, .. } => vec![
                format!("Could not parse `{}` as a JSON object:", path.display()),
                String::new(),
                message.clone(),
                String::new(),
                "Fix the configuration and commit again.".to_string(),
            ],
            Self::CommandNotFound { command } => vec![
                format!("Could not locate the `{command}` binary, make sure it is on your $PATH."),
                "Skipping the pre-commit hook.".to_string(),
            ],
            Self::NotGitRepo => vec![
                "Could not locate the root of this git repository.".to_string(),
                "Skipping the pre-commit hook.".to_string(),
            ],
            other => vec![other.to_string()],
        }
    }
}
