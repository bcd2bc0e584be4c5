//! Git repository operations.
//!
//! This module finds the repository root, its metadata directory and hooks
//! directory, and answers whether anything is staged for commit.

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the metadata entry at the repository root.
pub const GIT_ENTRY: &str = ".git";

/// Answers whether there is anything to commit.
#[cfg_attr(test, mockall::automock)]
pub trait StagedChanges {
    /// Returns true when the index differs from `HEAD`.
    fn has_staged_changes(&self) -> Result<bool>;
}

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (where .git is).
    root: PathBuf,
    /// Path to the metadata directory, after following `gitdir:` pointers.
    git_dir: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover() -> Result<Self> {
        Self::discover_from(&std::env::current_dir().map_err(|e| Error::io("get current dir", e))?)
    }

    /// Discovers the Git repository from a specific path using `git`.
    pub fn discover_from(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel", "--git-dir"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();

        let root = lines.next().map(PathBuf::from).ok_or(Error::NotGitRepo)?;

        let git_dir = lines
            .next()
            .map(|s| {
                let p = PathBuf::from(s);
                if p.is_absolute() {
                    p
                } else {
                    path.join(p)
                }
            })
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root, git_dir })
    }

    /// Searches `start` and its ancestors for a `.git` entry, without
    /// invoking `git`.
    pub fn locate(start: &Path) -> Result<Self> {
        for dir in start.ancestors() {
            let entry = dir.join(GIT_ENTRY);
            if !entry.exists() {
                tracing::debug!(path = %entry.display(), "No .git entry");
                continue;
            }

            if let Some(git_dir) = resolve_git_dir(&entry)? {
                tracing::debug!(path = %git_dir.display(), "Found git directory");
                return Ok(Self {
                    root: dir.to_path_buf(),
                    git_dir,
                });
            }
        }

        Err(Error::NotGitRepo)
    }

    /// Opens the repository rooted at `root` without validating it.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let entry = root.join(GIT_ENTRY);
        let git_dir = resolve_git_dir(&entry).ok().flatten().unwrap_or(entry);
        Self { root, git_dir }
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the metadata directory path.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the hooks directory path.
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        // Check for custom hooks path first
        if let Ok(output) = Command::new("git")
            .args(["config", "--get", "core.hooksPath"])
            .current_dir(&self.root)
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    let hooks_path = PathBuf::from(&path);
                    if hooks_path.is_absolute() {
                        return hooks_path;
                    }
                    return self.root.join(hooks_path);
                }
            }
        }

        self.git_dir.join("hooks")
    }

    /// Returns the path to a specific hook.
    #[must_use]
    pub fn hook_path(&self, hook_name: &str) -> PathBuf {
        self.hooks_dir().join(hook_name)
    }
}

impl StagedChanges for GitRepo {
    fn has_staged_changes(&self) -> Result<bool> {
        let output = Command::new("git")
            .args(["diff", "--cached", "--quiet"])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("check staged changes", e))?;

        // --quiet implies --exit-code: 1 means "differences found".
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(Error::git("diff --cached", stderr.trim().to_string()))
            },
        }
    }
}

/// Resolves a `.git` entry to the metadata directory.
///
/// Linked worktrees and submodules use a `.git` file holding
/// `gitdir: <path>`, relative to the directory containing the file.
pub fn resolve_git_dir(entry: &Path) -> Result<Option<PathBuf>> {
    if entry.is_dir() {
        return Ok(Some(entry.to_path_buf()));
    }

    if !entry.is_file() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(entry).map_err(|e| Error::io("read .git file", e))?;
    let Some(target) = content
        .lines()
        .find_map(|line| line.trim().strip_prefix("gitdir:"))
        .map(str::trim)
        .filter(|target| !target.is_empty())
    else {
        tracing::warn!(path = %entry.display(), "No gitdir pointer in .git file");
        return Ok(None);
    };

    let base = entry.parent().unwrap_or_else(|| Path::new("."));
    Ok(Some(base.join(target)))
}
