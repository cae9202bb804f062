//! Run translated statements against a database and turn the rows back into documents.

pub mod error;
pub mod executor;
pub mod materialize;
pub mod metrics;
pub mod query;
