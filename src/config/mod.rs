//! Configuration resolution for precommit-hook.
//!
//! The hook reads its settings from the project's `package.json` and an
//! optional `.pre-commit.json` override file (see [`sources`]). This module
//! merges them into a single [`ResolvedConfig`]:
//!
//! 1. built-in defaults and the caller's options,
//! 2. `precommit.<flag>` keys, then `pre-commit.<flag>` keys,
//! 3. the `pre-commit` (or `precommit`) entry: a run list or an object,
//! 4. `["test"]` when `scripts.test` is a real test command,
//! 5. the override file, whose `run` replaces the list even when empty.
//!
//! Later steps win over earlier ones.

pub mod sources;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use sources::{ProjectFiles, RawConfig, MANIFEST_FILE_NAME, OVERRIDE_FILE_NAME};

/// Keys holding the hook configuration, in lookup order.
pub const SECTION_KEYS: [&str; 2] = ["pre-commit", "precommit"];

/// Flag key prefixes, in application order (the last one wins).
pub const FLAG_PREFIXES: [&str; 2] = ["precommit.", "pre-commit."];

/// Test script written by `npm init` when no tests are configured.
pub const PLACEHOLDER_TEST_SCRIPT: &str = r#"echo "Error: no test specified" && exit 1"#;

/// Name of the script run when nothing else is configured.
pub const DEFAULT_SCRIPT: &str = "test";

/// Normalized hook configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Scripts to run, in order. `None` when nothing is configured.
    pub run: Option<Vec<String>>,
    /// Suppress all output.
    pub silent: bool,
    /// Colorize the `pre-commit:` prefix.
    pub colors: bool,
    /// Any other flag, copied verbatim (`ignorestatus`, `template`, ...).
    pub flags: BTreeMap<String, Value>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            run: None,
            silent: false,
            colors: console::colors_enabled(),
            flags: BTreeMap::new(),
        }
    }
}

impl ResolvedConfig {
    /// Applies a single configuration entry.
    ///
    /// `run`, `silent` and `colors` are normalized; values of the wrong
    /// shape leave the current setting untouched. Every other key is kept
    /// as a pass-through flag.
    pub fn set(&mut self, key: &str, value: &Value) {
        match key {
            "run" => {
                if let Some(run) = parse_run_list(value) {
                    self.run = Some(run);
                }
            },
            "silent" => {
                if let Some(silent) = as_flag(value) {
                    self.silent = silent;
                }
            },
            "colors" => {
                if let Some(colors) = as_flag(value) {
                    self.colors = colors;
                }
            },
            _ => {
                self.flags.insert(key.to_string(), value.clone());
            },
        }
    }

    /// Returns a pass-through flag.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    /// Returns true when the exit status should not fail the process.
    #[must_use]
    pub fn ignore_status(&self) -> bool {
        self.flag("ignorestatus")
            .and_then(as_flag)
            .unwrap_or(false)
    }

    /// Returns the scripts to run, or an empty slice.
    #[must_use]
    pub fn scripts(&self) -> &[String] {
        self.run.as_deref().unwrap_or_default()
    }
}

/// Merges the manifest and override file on top of `defaults`.
#[must_use]
pub fn resolve(
    manifest: &Value,
    overrides: Option<&Map<String, Value>>,
    defaults: &ResolvedConfig,
) -> ResolvedConfig {
    let mut config = defaults.clone();

    if let Some(manifest) = manifest.as_object() {
        for prefix in FLAG_PREFIXES {
            for (flag, value) in prefixed_flags(manifest, prefix) {
                config.set(flag, value);
            }
        }

        match section(manifest) {
            Some(Value::Object(section)) => {
                for (key, value) in section {
                    config.set(key, value);
                }
            },
            Some(run) => config.set("run", run),
            None => {},
        }

        if config.run.is_none() && has_real_test_script(manifest) {
            config.run = Some(vec![DEFAULT_SCRIPT.to_string()]);
        }
    }

    // The override file replaces the run list outright, even with nothing.
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            if key == "run" {
                config.run = parse_run_list(value);
            } else {
                config.set(key, value);
            }
        }
    }

    config
}

/// Splits a run list into script names.
///
/// Strings are split on commas and whitespace; arrays contribute their
/// string elements. Returns `None` when no name remains.
#[must_use]
pub fn parse_run_list(value: &Value) -> Option<Vec<String>> {
    let names: Vec<String> = match value {
        Value::String(list) => split_names(list).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_names)
            .collect(),
        _ => return None,
    };

    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

fn split_names(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Interprets a JSON value as an on/off switch.
#[must_use]
pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Null => Some(false),
        Value::Number(n) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Yields `(flag, value)` for every top-level key starting with `prefix`.
fn prefixed_flags<'a>(
    manifest: &'a Map<String, Value>,
    prefix: &'a str,
) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
    manifest.iter().filter_map(move |(key, value)| {
        key.strip_prefix(prefix)
            .filter(|flag| !flag.is_empty())
            .map(|flag| (flag, value))
    })
}

/// Returns the first section entry that configures something.
fn section(manifest: &Map<String, Value>) -> Option<&Value> {
    SECTION_KEYS
        .iter()
        .filter_map(|key| manifest.get(*key))
        .find(|value| value.is_object() || parse_run_list(value).is_some())
}

fn has_real_test_script(manifest: &Map<String, Value>) -> bool {
    match manifest.get("scripts").and_then(|scripts| scripts.get("test")) {
        Some(Value::String(script)) => !script.is_empty() && script != PLACEHOLDER_TEST_SCRIPT,
        Some(Value::Null | Value::Bool(false)) | None => false,
        Some(_) => true,
    }
}
