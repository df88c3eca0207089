//! File naming and line-format conventions of the model grid.
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ExtractError, Result};

/// Literal markers used to pair files and to locate values inside them.
///
/// The defaults describe the grid layout the tool was written for; every
/// field may be overridden from a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConventions {
    /// Suffix that marks a final result file, e.g. `run001_s_20.stat`.
    #[serde(default = "RunConventions::default_result_suffix")]
    pub result_suffix: String,
    /// Extension appended to the run name to locate its input file.
    #[serde(default = "RunConventions::default_input_extension")]
    pub input_extension: String,
    /// Text a result line starts with before the key.
    #[serde(default = "RunConventions::default_result_prefix")]
    pub result_prefix: String,
    /// Separator between the fields of a result line.
    #[serde(default = "RunConventions::default_result_separator")]
    pub result_separator: String,
    /// Zero-based index of the value field once a result line is split.
    #[serde(default = "RunConventions::default_result_field")]
    pub result_field: usize,
}

impl RunConventions {
    fn default_result_suffix() -> String {
        "_s_20.stat".to_string()
    }

    fn default_input_extension() -> String {
        ".in".to_string()
    }

    fn default_result_prefix() -> String {
        "value ".to_string()
    }

    fn default_result_separator() -> String {
        " # ".to_string()
    }

    const fn default_result_field() -> usize {
        2
    }

    /// Parse conventions from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if the JSON is invalid or leaves the
    /// result suffix or separator empty.
    pub fn from_json(json: &str, origin: &Path) -> Result<Self> {
        let conventions: Self = serde_json::from_str(json)
            .map_err(|err| ExtractError::config(origin, err.to_string()))?;
        conventions.validate(origin)?;
        Ok(conventions)
    }

    /// Load conventions from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the file cannot be read, otherwise the
    /// errors of [`RunConventions::from_json`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|err| ExtractError::io(path, err))?;
        Self::from_json(&json, path)
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        if self.result_suffix.is_empty() {
            return Err(ExtractError::config(origin, "result_suffix must not be empty"));
        }
        if self.result_separator.is_empty() {
            return Err(ExtractError::config(
                origin,
                "result_separator must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for RunConventions {
    fn default() -> Self {
        Self {
            result_suffix: Self::default_result_suffix(),
            input_extension: Self::default_input_extension(),
            result_prefix: Self::default_result_prefix(),
            result_separator: Self::default_result_separator(),
            result_field: Self::default_result_field(),
        }
    }
}
