//! Raw configuration sources.
//!
//! The hook reads two files from the project root: `package.json` and the
//! optional `.pre-commit.json` override file. Both must hold a JSON object.

use crate::core::error::{Error, Result};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Project manifest file name.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Dedicated override file name.
pub const OVERRIDE_FILE_NAME: &str = ".pre-commit.json";

/// Configuration as read from disk, before resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawConfig {
    /// The project manifest; an empty object when absent.
    pub manifest: Value,
    /// The override file, when present.
    pub overrides: Option<Map<String, Value>>,
}

/// Locates and reads the configuration files of a project.
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    root: PathBuf,
}

impl ProjectFiles {
    /// Creates a reader for the project rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    /// Path of the override file.
    #[must_use]
    pub fn override_path(&self) -> PathBuf {
        self.root.join(OVERRIDE_FILE_NAME)
    }

    /// Reads both sources.
    pub fn load(&self) -> Result<RawConfig> {
        Ok(RawConfig {
            manifest: self.load_manifest()?,
            overrides: self.load_overrides()?,
        })
    }

    /// Reads the manifest, or an empty object when there is none.
    pub fn load_manifest(&self) -> Result<Value> {
        let manifest = read_object(&self.manifest_path())?.unwrap_or_default();
        Ok(Value::Object(manifest))
    }

    /// Reads the override file, if it exists.
    pub fn load_overrides(&self) -> Result<Option<Map<String, Value>>> {
        read_object(&self.override_path())
    }
}

/// Reads `path` as a JSON object. A missing file yields `None`.
fn read_object(path: &Path) -> Result<Option<Map<String, Value>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Configuration file not present");
            return Ok(None);
        },
        Err(e) => return Err(Error::config_read(path, e)),
    };

    let value: Value =
        serde_json::from_str(&content).map_err(|e| Error::config_parse_with_source(path, e))?;

    match value {
        Value::Object(map) => {
            tracing::debug!(path = %path.display(), keys = map.len(), "Loaded configuration file");
            Ok(Some(map))
        },
        other => Err(Error::config_parse(
            path,
            format!("expected a JSON object, found {}", kind(&other)),
        )),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
