use std::path::PathBuf;

use serde::Serialize;

/// Fatal: the scan never starts with a partial catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog entry owned by `{owner}` has an empty name")]
    MissingName { owner: String },

    #[error("catalog entry `{name}` is missing its owner module")]
    MissingModule { name: String },

    #[error("catalog entry `{owner}.{name}` has min_arity {min} above max_arity {max}")]
    InvalidArity {
        name: String,
        owner: String,
        min: u32,
        max: u32,
    },
}

/// Per-file failure; isolated from the rest of the scan.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {path} near line {line}")]
    Parse { path: PathBuf, line: usize },
}

impl FileError {
    pub fn path(&self) -> &PathBuf {
        match self {
            FileError::Io { path, .. } | FileError::Parse { path, .. } => path,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            FileError::Io { .. } => DiagnosticKind::Io,
            FileError::Parse { .. } => DiagnosticKind::Parse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    Io,
    Parse,
}

/// A skipped file, surfaced next to the scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiagnostic {
    pub file: PathBuf,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl From<FileError> for FileDiagnostic {
    fn from(err: FileError) -> Self {
        Self {
            file: err.path().clone(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
