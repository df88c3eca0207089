//! Error type shared by every extraction stage.

use std::path::PathBuf;
use thiserror::Error;

/// Which file family a key was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Per-run `.in` parameter file.
    Input,
    /// Per-run `_s_20.stat` result file.
    Result,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Input => write!(f, "input file"),
            SourceKind::Result => write!(f, "results file"),
        }
    }
}

/// Errors raised while loading key maps, extracting records or writing the table.
///
/// Every variant is fatal to the batch; nothing is skipped and retried.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid key map {path}: {reason}")]
    Config { path: PathBuf, reason: String },
    #[error("key {key:?} not found in {kind} {path}")]
    MissingKey {
        key: String,
        kind: SourceKind,
        path: PathBuf,
    },
    #[error("line {line} of {path} matches key {key:?} but has no value field {field}")]
    MalformedLine {
        key: String,
        path: PathBuf,
        line: usize,
        field: usize,
    },
    #[error("run {run}: column {column} value {value:?} is not a number")]
    Format {
        run: String,
        column: String,
        value: String,
    },
    #[error("run {run}: no value for column {column}")]
    MissingColumn { run: String, column: String },
    #[error("table line {line}: {reason}")]
    Table { line: usize, reason: String },
    #[error("{message}: {path}")]
    Path { path: PathBuf, message: String },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;
