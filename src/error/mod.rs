//! Error handling for the rules engine.

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;

/// Specialized error type for the rules engine
#[derive(Debug, thiserror::Error)]
pub enum RulesEngineError {
    /// Error opening or reading the dataset file
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path of the file the operation failed on
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// Error decoding the dataset through Arrow
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// The dataset cannot yield a usable transaction matrix
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A query parameter is out of range or inconsistent
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RulesEngineError {
    /// IO error carrying the offending path.
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for per-query parameter errors, the class a caller can correct
    /// and retry (4xx-equivalent at an API boundary). Construction errors
    /// are fatal and never in this class.
    #[must_use]
    pub const fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter(_))
    }
}

/// Result type for rules-engine operations
pub type Result<T> = std::result::Result<T, RulesEngineError>;
