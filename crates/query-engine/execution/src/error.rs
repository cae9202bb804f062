//! Errors for execution.

use query_engine_translation::translation;

/// A type for execution errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Translation(#[from] translation::error::Error),
    /// The database rejected or failed the statement.
    #[error(transparent)]
    Execution(#[from] sqlx::Error),
    #[error("column '{column}' holds a value of type {type_name} that cannot be read")]
    UnsupportedRowValue { column: String, type_name: String },
    #[error("malformed projection: {0}")]
    MalformedProjection(String),
    #[error("error registering metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}
