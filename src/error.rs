//! Stage errors.

use std::path::{Path, PathBuf};

/// Failure of a single pipeline stage.
///
/// Every stage returns `Result<_, AlarmError>`; the pipeline converts a
/// failure into an absent result at the stage boundary.
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} is missing required columns: {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("{0}")]
    Unknown(String),
}

impl AlarmError {
    pub fn not_found(path: &Path) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
        }
    }

    /// Kind name shown in diagnostics and the JSON summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFoundError",
            Self::Schema { .. } => "SchemaError",
            Self::Unknown(_) => "UnknownError",
        }
    }
}

impl From<csv::Error> for AlarmError {
    fn from(e: csv::Error) -> Self {
        Self::Unknown(e.to_string())
    }
}

impl From<std::io::Error> for AlarmError {
    fn from(e: std::io::Error) -> Self {
        Self::Unknown(e.to_string())
    }
}
