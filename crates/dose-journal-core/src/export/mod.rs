//! Journal export and import.

mod journal;

pub use journal::*;

use thiserror::Error;

use crate::db::DbError;

/// Export and import errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(u32),

    #[error("Ingestion {ingestion} references missing experience {experience}")]
    MissingExperience { ingestion: String, experience: String },
}

pub type ExportResult<T> = Result<T, ExportError>;
