//! The pre-commit hook controller.
//!
//! [`Hook`] ties the pieces together: it loads the project configuration,
//! resolves it, runs the configured scripts and reports the outcome through
//! an exit callback supplied by the caller. The callback is the only way a
//! result leaves the hook, which keeps process termination out of the
//! library.

use crate::config::{self, ProjectFiles, RawConfig, ResolvedConfig};
use crate::core::error::Error;
use crate::core::git::{GitRepo, StagedChanges};
use crate::core::logger::{Logger, Message};
use crate::core::runner::{self, NpmScriptRunner, ScriptRunner};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Receives the final status code and, unless the run was clean, the lines
/// that were (or would have been) printed.
pub type ExitFn = Box<dyn FnMut(i32, Option<Vec<String>>)>;

/// Message reported when there is nothing to run.
const NOTHING_TO_RUN: &str = "No pre-commit scripts to run. Either `scripts.test` is missing \
from package.json\nor pre-commit is configured to run nothing.\nSkipping the pre-commit hook.";

/// Caller-supplied defaults for a hook.
#[derive(Debug, Clone, Default)]
pub struct HookOptions {
    /// Project root; defaults to the enclosing git repository.
    pub root: Option<PathBuf>,
    /// Report failures without failing the process.
    pub ignorestatus: bool,
    /// Default for `silent`.
    pub silent: Option<bool>,
    /// Default for `colors`; auto-detected when unset.
    pub colors: Option<bool>,
    /// Additional pass-through flags.
    pub flags: BTreeMap<String, Value>,
}

impl HookOptions {
    /// Builds the configuration the project settings are layered on.
    #[must_use]
    pub fn defaults(&self) -> ResolvedConfig {
        let mut config = ResolvedConfig::default();
        if let Some(silent) = self.silent {
            config.silent = silent;
        }
        if let Some(colors) = self.colors {
            config.colors = colors;
        }
        config.flags.extend(self.flags.clone());
        if self.ignorestatus {
            config
                .flags
                .insert("ignorestatus".to_string(), Value::Bool(true));
        }
        config
    }
}

/// A single pre-commit hook invocation.
pub struct Hook {
    /// Resolved configuration; may be adjusted before [`Hook::run`].
    pub config: ResolvedConfig,
    /// The project manifest; call [`Hook::parse`] after changing it.
    pub manifest: Value,
    overrides: Option<Map<String, Value>>,
    options: HookOptions,
    root: PathBuf,
    exit: ExitFn,
    scripts: Box<dyn ScriptRunner>,
    staged: Box<dyn StagedChanges>,
    halted: bool,
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}

impl Hook {
    /// Creates a hook for the repository at `options.root`, or the one
    /// enclosing the current directory.
    ///
    /// When no repository can be found the hook reports it with status 0
    /// and does nothing further.
    pub fn new(exit: impl FnMut(i32, Option<Vec<String>>) + 'static, options: HookOptions) -> Self {
        let located = match options.root.clone() {
            Some(root) => Ok(GitRepo::at(root)),
            None => GitRepo::discover(),
        };

        match located {
            Ok(repo) => {
                let root = repo.root().to_path_buf();
                let scripts = NpmScriptRunner::new(&root);
                Self::with_collaborators(exit, options, root, Box::new(scripts), Box::new(repo))
            },
            Err(e) => {
                tracing::warn!(error = %e, "Could not locate the repository");
                let root = std::env::current_dir().unwrap_or_default();
                let scripts = NpmScriptRunner::new(&root);
                let staged = GitRepo::at(&root);
                let mut hook =
                    Self::bare(exit, options, root, Box::new(scripts), Box::new(staged));
                hook.halt(&e, 0);
                hook
            },
        }
    }

    /// Creates a hook with explicit collaborators.
    ///
    /// The configuration is loaded from `root`. A configuration file that
    /// cannot be read or parsed is reported with status 1 and halts the hook.
    pub fn with_collaborators(
        exit: impl FnMut(i32, Option<Vec<String>>) + 'static,
        options: HookOptions,
        root: PathBuf,
        scripts: Box<dyn ScriptRunner>,
        staged: Box<dyn StagedChanges>,
    ) -> Self {
        let mut hook = Self::bare(exit, options, root, scripts, staged);

        match ProjectFiles::new(&hook.root).load() {
            Ok(RawConfig {
                manifest,
                overrides,
            }) => {
                hook.manifest = manifest;
                hook.overrides = overrides;
                hook.parse();
            },
            Err(e) => {
                let code = i32::from(e.is_config_error());
                hook.halt(&e, code);
            },
        }

        hook
    }

    fn bare(
        exit: impl FnMut(i32, Option<Vec<String>>) + 'static,
        options: HookOptions,
        root: PathBuf,
        scripts: Box<dyn ScriptRunner>,
        staged: Box<dyn StagedChanges>,
    ) -> Self {
        Self {
            config: options.defaults(),
            manifest: Value::Object(Map::new()),
            overrides: None,
            options,
            root,
            exit: Box::new(exit),
            scripts,
            staged,
            halted: false,
        }
    }

    /// Re-derives [`Hook::config`] from the manifest and override file.
    pub fn parse(&mut self) {
        self.config = config::resolve(
            &self.manifest,
            self.overrides.as_ref(),
            &self.options.defaults(),
        );
        tracing::debug!(config = ?self.config, "Resolved configuration");
    }

    /// Returns whether output is suppressed.
    #[must_use]
    pub const fn silent(&self) -> bool {
        self.config.silent
    }

    /// Returns whether output is colorized.
    #[must_use]
    pub const fn colors(&self) -> bool {
        self.config.colors
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true when construction already reported a fatal condition.
    #[must_use]
    pub const fn halted(&self) -> bool {
        self.halted
    }

    /// Prints `message` and reports `code` through the exit callback.
    ///
    /// Returns true when `code` is 0.
    pub fn log(&mut self, message: impl Into<Message>, code: i32) -> bool {
        let logger = Logger::new(self.config.silent, self.config.colors);
        let lines = logger.format(&message.into(), code);
        logger.emit(&lines, code);
        (self.exit)(code, Some(lines));
        code == 0
    }

    /// Runs the configured scripts.
    ///
    /// Reports `(0, None)` when every script passes or nothing is staged,
    /// and `(1, lines)` describing the first failing script otherwise.
    ///
    /// Scripts run on a private current-thread runtime, so this must not be
    /// called from async code; inside a tokio runtime the run is reported
    /// as an internal error with status 1.
    pub fn run(&mut self) {
        if self.halted {
            tracing::debug!("Hook halted during setup, not running checks");
            return;
        }

        match self.staged.has_staged_changes() {
            Ok(false) => {
                tracing::debug!("No staged changes, skipping checks");
                (self.exit)(0, None);
                return;
            },
            Ok(true) => {},
            Err(e) => tracing::warn!(error = %e, "Could not query staged changes, running checks"),
        }

        let names = self.config.scripts().to_vec();
        if names.is_empty() {
            self.log(NOTHING_TO_RUN, 0);
            return;
        }

        let progress = !self.config.silent;
        match runner::run_checks(self.scripts.as_ref(), &names, progress) {
            Ok(outcome) if outcome.success() => (self.exit)(0, None),
            Ok(outcome) => {
                self.log(outcome.report_lines(), 1);
            },
            Err(e @ Error::CommandNotFound { .. }) => {
                self.log(e.report_lines(), 0);
            },
            Err(e) => {
                self.log(e.report_lines(), 1);
            },
        }
    }

    fn halt(&mut self, error: &Error, code: i32) {
        self.halted = true;
        self.log(error.report_lines(), code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MANIFEST_FILE_NAME, OVERRIDE_FILE_NAME};
    use crate::core::git::MockStagedChanges;
    use crate::core::runner::{ExecutionResult, MockScriptRunner};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    type Calls = Rc<RefCell<Vec<(i32, Option<Vec<String>>)>>>;

    fn recorder() -> (Calls, impl FnMut(i32, Option<Vec<String>>) + 'static) {
        let calls: Calls = Rc::default();
        let sink = Rc::clone(&calls);
        (calls, move |code, lines| sink.borrow_mut().push((code, lines)))
    }

    fn options() -> HookOptions {
        HookOptions {
            ignorestatus: true,
            silent: Some(true),
            colors: Some(false),
            ..HookOptions::default()
        }
    }

    fn project(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().expect("create temp dir");
        for (name, content) in files {
            std::fs::write(temp.path().join(name), content).expect("write file");
        }
        temp
    }

    fn staged(has_changes: bool) -> Box<MockStagedChanges> {
        let mut mock = MockStagedChanges::new();
        mock.expect_has_staged_changes()
            .returning(move || Ok(has_changes));
        Box::new(mock)
    }

    fn hook_in(
        temp: &TempDir,
        options: HookOptions,
        scripts: MockScriptRunner,
        staged: Box<MockStagedChanges>,
    ) -> (Calls, Hook) {
        let (calls, exit) = recorder();
        let hook = Hook::with_collaborators(
            exit,
            options,
            temp.path().to_path_buf(),
            Box::new(scripts),
            staged,
        );
        (calls, hook)
    }

    fn names(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| (*s).to_string()).collect())
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_construction_reports_nothing_on_success() {
        let temp = project(&[]);
        let (calls, hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));
        assert!(calls.borrow().is_empty());
        assert!(!hook.halted());
        assert!(hook.config.ignore_status());
    }

    #[test]
    fn test_accessors_mirror_defaults() {
        let temp = project(&[]);
        let opts = HookOptions {
            silent: None,
            colors: None,
            ..HookOptions::default()
        };
        let (_calls, hook) = hook_in(&temp, opts, MockScriptRunner::new(), staged(true));
        assert!(!hook.silent());
        assert_eq!(hook.colors(), console::colors_enabled());
    }

    #[test]
    fn test_override_file_beats_manifest() {
        let temp = project(&[
            (MANIFEST_FILE_NAME, r#"{ "pre-commit": "test" }"#),
            (OVERRIDE_FILE_NAME, r#"{ "run": ["lint", "bench"] }"#),
        ]);
        let (_calls, hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));
        assert_eq!(hook.config.run, names(&["lint", "bench"]));
    }

    #[test]
    fn test_malformed_override_file_exits_with_one() {
        let temp = project(&[(OVERRIDE_FILE_NAME, r#"{ "bad": [json }"#)]);
        let (calls, hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));

        assert!(hook.halted());
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        let (code, lines) = &calls[0];
        assert_eq!(*code, 1);
        assert!(lines.as_ref().is_some_and(|lines| !lines.is_empty()));
    }

    #[test]
    fn test_unreadable_override_file_exits_with_one() {
        let temp = project(&[]);
        std::fs::create_dir(temp.path().join(OVERRIDE_FILE_NAME)).expect("create dir");
        let (calls, _hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));
        assert_eq!(calls.borrow()[0].0, 1);
    }

    #[test]
    fn test_halted_hook_does_not_run() {
        let temp = project(&[(OVERRIDE_FILE_NAME, "nope")]);
        let mut scripts = MockScriptRunner::new();
        scripts.expect_run_script().never();
        let mut staged_mock = MockStagedChanges::new();
        staged_mock.expect_has_staged_changes().never();

        let (calls, mut hook) = hook_in(&temp, options(), scripts, Box::new(staged_mock));
        hook.run();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_new_with_explicit_root() {
        let temp = project(&[(MANIFEST_FILE_NAME, r#"{ "precommit": "lint" }"#)]);
        let (_calls, exit) = recorder();
        let hook = Hook::new(
            exit,
            HookOptions {
                root: Some(temp.path().to_path_buf()),
                ..options()
            },
        );
        assert_eq!(hook.root(), temp.path());
        assert_eq!(hook.config.run, names(&["lint"]));
    }

    // =========================================================================
    // parse
    // =========================================================================

    #[test]
    fn test_parse_picks_up_manifest_changes() {
        let temp = project(&[]);
        let (_calls, mut hook) = hook_in(
            &temp,
            HookOptions::default(),
            MockScriptRunner::new(),
            staged(true),
        );
        assert!(!hook.silent());

        hook.manifest = json!({ "precommit.silent": true });
        hook.parse();

        assert!(hook.config.silent);
        assert!(hook.silent());
    }

    #[test]
    fn test_parse_overwrites_earlier_results() {
        let temp = project(&[]);
        let (_calls, mut hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));

        hook.manifest = json!({ "pre-commit": "a b" });
        hook.parse();
        assert_eq!(hook.config.run, names(&["a", "b"]));

        hook.manifest = json!({ "scripts": { "test": "echo \"Error: no test specified\" && exit 1" } });
        hook.parse();
        assert_eq!(hook.config.run, None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let temp = project(&[(MANIFEST_FILE_NAME, r#"{ "pre-commit": { "run": "x y z", "silent": true } }"#)]);
        let (_calls, mut hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));
        let first = hook.config.clone();
        hook.parse();
        assert_eq!(hook.config, first);
        assert_eq!(first.run, names(&["x", "y", "z"]));
        assert!(first.silent);
    }

    // =========================================================================
    // log
    // =========================================================================

    #[test]
    fn test_log_frames_lines_and_exits() {
        let temp = project(&[]);
        let (calls, mut hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));

        assert!(!hook.log(["foo"], 1));

        let calls = calls.borrow();
        let (code, lines) = &calls[0];
        assert_eq!(*code, 1);
        assert_eq!(
            lines.as_deref(),
            Some(&["pre-commit: ".to_string(), "pre-commit: foo".to_string(), "pre-commit: ".to_string()][..])
        );
    }

    #[test]
    fn test_log_custom_code_and_split() {
        let temp = project(&[]);
        let (calls, mut hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));

        assert!(hook.log("foo\nbar", 0));

        let calls = calls.borrow();
        let (code, lines) = &calls[0];
        assert_eq!(*code, 0);
        let lines = lines.as_ref().expect("lines");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "pre-commit: foo");
        assert_eq!(lines[2], "pre-commit: bar");
    }

    #[test]
    fn test_log_respects_colors_flag() {
        let temp = project(&[]);
        let (calls, mut hook) = hook_in(&temp, options(), MockScriptRunner::new(), staged(true));

        hook.config.colors = true;
        hook.log("foo", 1);
        hook.config.colors = false;
        hook.log("foo", 1);

        let calls = calls.borrow();
        let colored = calls[0].1.as_ref().expect("lines");
        let plain = calls[1].1.as_ref().expect("lines");
        assert!(colored.iter().all(|l| l.contains('\u{1b}')));
        assert!(plain.iter().all(|l| !l.contains('\u{1b}')));
    }

    // =========================================================================
    // run
    // =========================================================================

    #[test]
    fn test_run_all_pass_exits_clean() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts
            .expect_run_script()
            .withf(|name| name == "example-pass")
            .times(1)
            .returning(|name| Ok(ExecutionResult::new(name, 0, "ok")));

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(true));
        hook.config.run = names(&["example-pass"]);
        hook.run();

        assert_eq!(*calls.borrow(), vec![(0, None)]);
    }

    #[test]
    fn test_run_second_of_three_fails() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        let mut seq = Sequence::new();
        scripts
            .expect_run_script()
            .withf(|name| name == "lint")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name| Ok(ExecutionResult::new(name, 0, "")));
        scripts
            .expect_run_script()
            .withf(|name| name == "example-fail")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|name| Ok(ExecutionResult::new(name, 1, "")));
        scripts
            .expect_run_script()
            .withf(|name| name == "bench")
            .never();

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(true));
        hook.config.run = names(&["lint", "example-fail", "bench"]);
        hook.run();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        let (code, lines) = &calls[0];
        assert_eq!(*code, 1);
        let lines = lines.as_ref().expect("lines");
        assert!(lines[1].contains("`example-fail`"));
        assert!(lines[1].contains("(2/3)"));
        assert!(lines[2].contains("code (1)"));
    }

    #[test]
    fn test_run_skips_without_staged_changes() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts.expect_run_script().never();

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(false));
        hook.config.run = names(&["example-pass"]);
        hook.run();

        assert_eq!(*calls.borrow(), vec![(0, None)]);
    }

    #[test]
    fn test_run_proceeds_when_staged_query_fails() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts
            .expect_run_script()
            .times(1)
            .returning(|name| Ok(ExecutionResult::new(name, 0, "")));
        let mut staged_mock = MockStagedChanges::new();
        staged_mock
            .expect_has_staged_changes()
            .returning(|| Err(Error::git("diff --cached", "boom")));

        let (calls, mut hook) = hook_in(&temp, options(), scripts, Box::new(staged_mock));
        hook.config.run = names(&["test"]);
        hook.run();

        assert_eq!(*calls.borrow(), vec![(0, None)]);
    }

    #[test]
    fn test_run_with_nothing_configured() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts.expect_run_script().never();

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(true));
        hook.run();

        let calls = calls.borrow();
        assert_eq!(calls[0].0, 0);
        assert!(calls[0].1.is_some());
    }

    #[test]
    fn test_run_missing_npm_skips_with_zero() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts.expect_run_script().returning(|_| {
            Err(Error::CommandNotFound {
                command: "npm".to_string(),
            })
        });

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(true));
        hook.config.run = names(&["test"]);
        hook.run();

        let calls = calls.borrow();
        assert_eq!(calls[0].0, 0);
        assert!(calls[0].1.as_ref().is_some_and(|l| l[1].contains("`npm`")));
    }

    #[test]
    fn test_run_spawn_error_exits_with_one() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts
            .expect_run_script()
            .returning(|_| Err(Error::io("spawn command", std::io::Error::other("denied"))));

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(true));
        hook.config.run = names(&["test"]);
        hook.run();

        assert_eq!(calls.borrow()[0].0, 1);
    }

    #[test]
    fn test_ignorestatus_does_not_change_fail_fast() {
        let temp = project(&[]);
        let mut scripts = MockScriptRunner::new();
        scripts
            .expect_run_script()
            .times(1)
            .returning(|name| Ok(ExecutionResult::new(name, 2, "")));

        let (calls, mut hook) = hook_in(&temp, options(), scripts, staged(true));
        hook.config.run = names(&["a", "b"]);
        hook.run();

        assert!(hook.config.ignore_status());
        assert_eq!(calls.borrow()[0].0, 1);
    }
}
