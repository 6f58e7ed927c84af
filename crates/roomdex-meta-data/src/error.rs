//! Error types for the data layer

use thiserror::Error;

/// Result type alias for data layer operations
pub type MetaDataResult<T> = Result<T, MetaDataError>;

/// Errors that can occur in the relational data layer
#[derive(Error, Debug)]
pub enum MetaDataError {
    /// Underlying database driver error, wrapped with the operation name
    #[error("Database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// An entity that was expected to exist was not found
    #[error("Not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error for other issues
    #[error("Other error: {0}")]
    Other(String),
}

impl MetaDataError {
    /// Wrap a sqlx error with the operation it occurred in
    pub const fn database(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Database { operation, source }
    }
}

/// Extension trait for attaching operation names to sqlx results
pub trait MetaDataErrorExt<T> {
    /// Map a sqlx error into a `MetaDataError::Database` carrying the
    /// operation name for debuggability across the trigger/worker boundary
    fn map_db_err(self, operation: &'static str) -> MetaDataResult<T>;
}

impl<T> MetaDataErrorExt<T> for Result<T, sqlx::Error> {
    fn map_db_err(self, operation: &'static str) -> MetaDataResult<T> {
        self.map_err(|e| MetaDataError::database(operation, e))
    }
}
