//! Errors surfaced by the settings and record-table collaborators
//!
//! The simulation itself never returns errors: arithmetic anomalies saturate
//! and broken invariants panic.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    /// Reading or writing a file failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A file did not hold the expected JSON document
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Settings that cannot produce a playable game
    InvalidSettings(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on {}: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "malformed json in {}: {source}", path.display())
            }
            Self::InvalidSettings(reason) => write!(f, "invalid settings: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidSettings(_) => None,
        }
    }
}
