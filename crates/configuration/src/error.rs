//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

/// The errors that can be thrown when reading a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("unsupported configuration version {0}, expected 1")]
    UnsupportedVersion(u32),

    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The errors that can be thrown when turning a parsed configuration into a runtime one.
#[derive(Debug, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("invalid configuration field {field_name}: {message}")]
    MissingEnvironmentVariable { field_name: String, message: String },
    #[error("the schema of collection {collection} must be a JSON object")]
    MalformedCollectionSchema { collection: String },
}
