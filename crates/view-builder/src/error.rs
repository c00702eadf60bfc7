//! Error types for view builds
//!
//! Every variant is fatal to the build that raised it. Tolerated relationship gaps are not
//! errors: the resolver logs them and the mapper omits the join.

use thiserror::Error;

/// Result type alias for view build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Error type for view builds
#[derive(Error, Debug)]
pub enum BuildError {
    /// A record is missing a required field or carries an unusable value
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: invalid date in {field}: {value:?}")]
    InvalidDate {
        field: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The requested dataset has no registered mapper variant
    #[error("No matching dataset model: {0:?}")]
    Registry(String),

    /// A mandatory relationship lookup found nothing
    #[error("Relationship error: {source_row} references {key:?}, which was not found")]
    Relationship { source_row: String, key: String },

    /// A record failed; wraps the cause with its position in the stream (1-based)
    #[error("Dataset {dataset:?} failed at record {position}: {source}")]
    Record {
        dataset: String,
        position: usize,
        #[source]
        source: Box<BuildError>,
    },

    /// The sink rejected a build's write set; nothing was committed
    #[error("Dataset {dataset:?} failed at commit: {source}")]
    Commit {
        dataset: String,
        #[source]
        source: Box<BuildError>,
    },

    /// The sink rejected the write set
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] view_common::CommonError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BuildError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn relationship(source_row: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Relationship {
            source_row: source_row.into(),
            key: key.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Attach the dataset name and record position to a per-record failure
    pub fn at_record(self, dataset: &str, position: usize) -> Self {
        Self::Record {
            dataset: dataset.to_string(),
            position,
            source: Box::new(self),
        }
    }

    /// Attach the dataset name to a failed commit
    pub fn at_commit(self, dataset: &str) -> Self {
        Self::Commit {
            dataset: dataset.to_string(),
            source: Box::new(self),
        }
    }

    /// The underlying failure, with any record or commit context stripped
    pub fn root(&self) -> &BuildError {
        match self {
            BuildError::Record { source, .. } | BuildError::Commit { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            BuildError::Validation(_) | BuildError::InvalidDate { .. }
        )
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.root(), BuildError::Relationship { .. })
    }

    pub fn is_registry(&self) -> bool {
        matches!(self.root(), BuildError::Registry(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_context_is_transparent_to_classification() {
        let err = BuildError::relationship("policy:AAA", "government-organisation:ZZZ")
            .at_record("development-policy", 3);

        assert!(err.is_relationship());
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Dataset \"development-policy\" failed at record 3: Relationship error: \
             policy:AAA references \"government-organisation:ZZZ\", which was not found"
        );
    }

    #[test]
    fn test_commit_context_names_dataset() {
        let err = BuildError::storage("category \"cil\" of type \"developer-agreement-type\" already exists")
            .at_commit("developer-agreement-type");

        assert!(matches!(err.root(), BuildError::Storage(_)));
        assert!(err
            .to_string()
            .starts_with("Dataset \"developer-agreement-type\" failed at commit: Storage error:"));
    }

    #[test]
    fn test_root_of_plain_error_is_itself() {
        let err = BuildError::Registry("unknown".to_string());
        assert!(matches!(err.root(), BuildError::Registry(name) if name == "unknown"));
        assert!(err.is_registry());
    }
}
