//! Metadata information regarding the collections we store and how they map onto tables.

pub mod collection;
pub mod registry;

// re-export without modules
pub use collection::*;
pub use registry::*;

/// A document, as stored in and read back from a collection.
pub type Document = serde_json::Map<String, serde_json::Value>;
