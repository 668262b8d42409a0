//! Error types for skillbook operations

use crate::types::SkillId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for skillbook operations
pub type SkillbookResult<T> = Result<T, SkillbookError>;

/// Error type for skillbook operations.
///
/// An absent or unparsable layer file is not an error: loads recover it as an
/// empty collection. Everything else surfaces to the caller of the operation
/// that triggered it.
#[derive(Debug, Error)]
pub enum SkillbookError {
    /// I/O or serialization failure while reading or writing a layer file
    #[error("storage error at {path}: {message}")]
    Storage { path: PathBuf, message: String },

    /// A skill with this id is already present in the in-memory view
    #[error("duplicate skill id: {0}")]
    DuplicateId(SkillId),

    /// No skill with this id in the in-memory view
    #[error("skill not found: {0}")]
    SkillNotFound(SkillId),

    /// A write was attempted with no hierarchy configuration present
    #[error("routing error: {message}")]
    Routing { message: String },
}

impl SkillbookError {
    /// Build a storage error for a path
    pub fn storage(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Build a routing error
    pub fn routing(message: impl Into<String>) -> Self {
        Self::Routing {
            message: message.into(),
        }
    }
}
