//! Translate document filters, updates, schemas and index definitions to SQL.

pub mod dialect;
pub mod error;
pub mod fields;
pub mod helpers;
pub mod mutation;
pub mod query;
pub mod schema;
pub mod translator;
pub mod values;

pub use translator::Translator;
