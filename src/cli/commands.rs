//! CLI command implementations.

use super::ColorChoice;
use crate::core::error::{Error, Result};
use crate::core::git::GitRepo;
use crate::core::hook::{Hook, HookOptions};
use console::style;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

/// Name of the git hook.
const HOOK_NAME: &str = "pre-commit";

/// Suffix of the backup made of a pre-existing hook.
const BACKUP_SUFFIX: &str = ".old";

/// Hook marker comment.
const HOOK_MARKER: &str = "# precommit-hook";

/// Hook script template; `{exe}` is replaced with the binary path.
const HOOK_SCRIPT: &str = r#"#!/usr/bin/env bash
# precommit-hook: installed by `precommit install`

if git diff --cached --quiet; then
  echo "pre-commit: No staged changes. Skipping the pre-commit hook."
  exit 0
fi

"{exe}" run
if [ $? -ne 0 ]; then
  exit 1
fi
exit 0
"#;

/// What `install` did to an existing hook.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Installed {
    Fresh,
    Replaced,
    BackedUp(PathBuf),
}

/// What `uninstall` did.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Uninstalled {
    NotInstalled,
    Foreign,
    Removed,
    Restored(PathBuf),
}

/// Run the configured scripts.
pub fn run(ignore_status: bool, silent: bool, color: ColorChoice) -> Result<ExitCode> {
    let options = HookOptions {
        ignorestatus: ignore_status,
        silent: silent.then_some(true),
        colors: color.forced(),
        ..HookOptions::default()
    };

    let (status, exit) = recorder();
    let mut hook = Hook::new(exit, options);
    hook.run();

    let code = status.get();
    if code != 0 && hook.config.ignore_status() {
        tracing::warn!(code, "Check failed, exit status ignored");
        return Ok(ExitCode::SUCCESS);
    }

    Ok(exit_code(code))
}

/// Install git hook.
pub fn install() -> Result<ExitCode> {
    let Some(repo) = locate_repo() else {
        return Ok(ExitCode::SUCCESS);
    };

    let installed = std::env::current_exe()
        .map_err(|e| Error::io("locate precommit binary", e))
        .and_then(|exe| install_hook(&repo, &exe));

    match installed {
        Ok(Installed::BackedUp(backup)) => {
            eprintln!(
                "{} Backed up existing hook to {}",
                style("•").cyan(),
                backup.display()
            );
            eprintln!(
                "{} Installed pre-commit hook at {}",
                style("✓").green(),
                repo.hook_path(HOOK_NAME).display()
            );
        },
        Ok(Installed::Fresh | Installed::Replaced) => eprintln!(
            "{} Installed pre-commit hook at {}",
            style("✓").green(),
            repo.hook_path(HOOK_NAME).display()
        ),
        Err(e) => {
            eprintln!("{} Failed to install the pre-commit hook: {e}", style("!").yellow());
            eprintln!("  Make sure the hooks directory is writable.");
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Uninstall git hook.
pub fn uninstall() -> Result<ExitCode> {
    let Some(repo) = locate_repo() else {
        return Ok(ExitCode::SUCCESS);
    };
    let hook_path = repo.hook_path(HOOK_NAME);

    match uninstall_hook(&repo) {
        Ok(Uninstalled::NotInstalled) => eprintln!(
            "{} No hook installed at {}",
            style("•").cyan(),
            hook_path.display()
        ),
        Ok(Uninstalled::Foreign) => {
            eprintln!(
                "{} Hook at {} was not installed by precommit",
                style("!").yellow(),
                hook_path.display()
            );
            eprintln!("  Remove manually if desired.");
        },
        Ok(Uninstalled::Removed) => eprintln!(
            "{} Removed pre-commit hook from {}",
            style("✓").green(),
            hook_path.display()
        ),
        Ok(Uninstalled::Restored(backup)) => eprintln!(
            "{} Restored previous hook from {}",
            style("✓").green(),
            backup.display()
        ),
        Err(e) => eprintln!("{} Failed to remove the pre-commit hook: {e}", style("!").yellow()),
    }

    Ok(ExitCode::SUCCESS)
}

/// Show the resolved configuration.
pub fn config(color: ColorChoice) -> Result<ExitCode> {
    let options = HookOptions {
        colors: color.forced(),
        ..HookOptions::default()
    };

    let (status, exit) = recorder();
    let hook = Hook::new(exit, options);
    if hook.halted() {
        return Ok(exit_code(status.get()));
    }

    let json = serde_json::to_string_pretty(&hook.config).map_err(|e| Error::Internal {
        message: format!("Failed to serialize config: {e}"),
    })?;
    println!("{json}");

    Ok(ExitCode::SUCCESS)
}

/// Returns an exit callback that records the last reported status.
fn recorder() -> (Rc<Cell<i32>>, impl FnMut(i32, Option<Vec<String>>) + 'static) {
    let status = Rc::new(Cell::new(0));
    let sink = Rc::clone(&status);
    (status, move |code, _lines| sink.set(code))
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn locate_repo() -> Option<GitRepo> {
    let located = std::env::current_dir()
        .map_err(|e| Error::io("get current dir", e))
        .and_then(|cwd| GitRepo::locate(&cwd));

    match located {
        Ok(repo) => Some(repo),
        Err(e) => {
            tracing::debug!(error = %e, "No repository found");
            eprintln!(
                "{} Not able to find a .git folder, so the pre-commit hook is not installed.",
                style("!").yellow()
            );
            None
        },
    }
}

fn hook_script(exe: &Path) -> String {
    HOOK_SCRIPT.replace("{exe}", &exe.display().to_string())
}

fn is_ours(path: &Path) -> bool {
    std::fs::read_to_string(path).is_ok_and(|content| content.contains(HOOK_MARKER))
}

fn backup_path(hook_path: &Path) -> PathBuf {
    let mut name = hook_path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn install_hook(repo: &GitRepo, exe: &Path) -> Result<Installed> {
    let hooks_dir = repo.hooks_dir();
    let hook_path = hooks_dir.join(HOOK_NAME);

    if !hooks_dir.exists() {
        std::fs::create_dir_all(&hooks_dir).map_err(|e| Error::io("create hooks dir", e))?;
    } else if !hooks_dir.is_dir() {
        return Err(Error::HookInstall {
            message: format!("{} is not a directory", hooks_dir.display()),
        });
    }

    let mut installed = Installed::Fresh;
    if let Ok(metadata) = std::fs::symlink_metadata(&hook_path) {
        installed = Installed::Replaced;
        if metadata.file_type().is_symlink() {
            std::fs::remove_file(&hook_path).map_err(|e| Error::io("remove hook symlink", e))?;
        } else if !is_ours(&hook_path) {
            let backup = backup_path(&hook_path);
            std::fs::copy(&hook_path, &backup).map_err(|e| Error::io("backup hook", e))?;
            installed = Installed::BackedUp(backup);
        }
    }

    std::fs::write(&hook_path, hook_script(exe)).map_err(|e| Error::io("write hook", e))?;
    make_executable(&hook_path)?;

    tracing::debug!(path = %hook_path.display(), ?installed, "Hook written");
    Ok(installed)
}

fn uninstall_hook(repo: &GitRepo) -> Result<Uninstalled> {
    let hook_path = repo.hook_path(HOOK_NAME);

    if std::fs::symlink_metadata(&hook_path).is_err() {
        return Ok(Uninstalled::NotInstalled);
    }

    if !is_ours(&hook_path) {
        return Ok(Uninstalled::Foreign);
    }

    let backup = backup_path(&hook_path);
    if backup.is_file() {
        std::fs::copy(&backup, &hook_path).map_err(|e| Error::io("restore hook", e))?;
        make_executable(&hook_path)?;
        std::fs::remove_file(&backup).map_err(|e| Error::io("remove hook backup", e))?;
        return Ok(Uninstalled::Restored(backup));
    }

    std::fs::remove_file(&hook_path).map_err(|e| Error::io("remove hook", e))?;
    Ok(Uninstalled::Removed)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .map_err(|e| Error::io("get hook metadata", e))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|e| Error::io("set hook perms", e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
