//! Errors for translation.

use query_engine_sql::sql::dialect::Dialect;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("operator '{operator}' is not supported for the {dialect} dialect")]
    UnsupportedOperator { operator: String, dialect: Dialect },
    #[error("malformed filter: {0}")]
    MalformedFilter(String),
    #[error("malformed update: {0}")]
    MalformedUpdate(String),
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("malformed schema: {0}")]
    MalformedSchema(String),
    #[error("malformed index: {0}")]
    MalformedIndex(String),
    #[error("unable to serialize value: {0}")]
    Serialization(String),
}
