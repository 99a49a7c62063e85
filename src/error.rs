//! Error taxonomy for scanning
//!
//! None of these errors abort a scan. They are recorded against the
//! affected path in the scan statistics and the scan moves on.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// A non-fatal failure affecting a single unit of work
#[derive(Error, Debug)]
pub enum ScanError {
    /// Permission denied, vanished file, unreadable ignore file
    #[error("failed to read {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed source under a structural extractor
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Invalid glob syntax; the pattern was matched literally instead
    #[error("invalid pattern '{pattern}', matched literally: {source}")]
    Pattern {
        pattern: String,
        /// Ignore file declaring the pattern; `None` for configured patterns
        origin: Option<PathBuf>,
        #[source]
        source: globset::Error,
    },

    /// Error surfaced by the directory iterator
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ScanError {
    /// Build a filesystem error for a path
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for a path
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ScanError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build a pattern error for a glob that fell back to literal matching
    pub fn pattern(
        pattern: impl Into<String>,
        origin: Option<&std::path::Path>,
        source: globset::Error,
    ) -> Self {
        ScanError::Pattern {
            pattern: pattern.into(),
            origin: origin.map(|p| p.to_path_buf()),
            source,
        }
    }

    /// Category used when recording the error in statistics
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::Filesystem { .. } | ScanError::Walk(_) => ErrorCategory::Filesystem,
            ScanError::Parse { .. } => ErrorCategory::Parse,
            ScanError::Pattern { .. } => ErrorCategory::Pattern,
        }
    }

    /// Path the error relates to, if any
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            ScanError::Filesystem { path, .. } | ScanError::Parse { path, .. } => {
                Some(path.clone())
            }
            ScanError::Pattern { origin, .. } => origin.clone(),
            ScanError::Walk(err) => err.path().map(|p| p.to_path_buf()),
        }
    }
}

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Filesystem,
    Parse,
    Pattern,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Filesystem => write!(f, "filesystem"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Pattern => write!(f, "pattern"),
        }
    }
}
