//! Error types for values file edits
//!
//! Covers:
//! - Reading and writing the values file
//! - Parsing the document
//! - Resolving dot paths against the document

use crate::path::PathError;
use std::path::PathBuf;

/// Errors while patching a values file
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// IO error during file read
    #[error("io error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error during file write
    #[error("io error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not valid YAML
    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Key was malformed
    #[error("invalid key: {0}")]
    InvalidPath(#[from] PathError),

    /// A segment of the path does not exist; no structure is created
    #[error("key {path} not found")]
    KeyNotFound { path: String },

    /// Sequence index past the end
    #[error("index {index} out of range at {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    /// Path addresses a mapping or sequence instead of a scalar
    #[error("value at {path} is not a scalar")]
    NotAScalar { path: String },

    /// Node at path uses a construct that cannot be edited in place
    #[error("unsupported YAML at {path}: {construct}")]
    Unsupported {
        path: String,
        construct: &'static str,
    },

    /// Edited document did not read back the written value
    #[error("update of {path} could not be verified")]
    Unverified { path: String },

    /// Relative path climbs out of the working directory
    #[error("path {} escapes the working directory", path.display())]
    PathEscapesWorkDir { path: PathBuf },
}

impl PatchError {
    /// Create read error for path
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create write error for path
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Check if the values file itself was missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
