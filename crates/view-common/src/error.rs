//! Error types shared by view builder crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while parsing shared identity types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Invalid entity identifier: {0:?}")]
    InvalidEntity(String),

    #[error("Unknown typology: {0:?}")]
    UnknownTypology(String),
}
