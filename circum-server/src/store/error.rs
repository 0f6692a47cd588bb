//! Schedule store error types.

use std::path::PathBuf;

use crate::domain::DomainError;

/// Errors that can occur when loading or replacing the schedule.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Records violate a data-model invariant
    #[error("invalid schedule: {0}")]
    Invalid(#[from] DomainError),

    /// Seed file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Seed JSON did not match the expected shape
    #[error("seed JSON error: {message}")]
    Json { message: String },

    /// CSV import failed
    #[error("CSV import error in {file}: {message}")]
    Csv { file: &'static str, message: String },
}
