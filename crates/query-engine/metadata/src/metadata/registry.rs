//! Where collection schemas are registered and looked up.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use super::collection::CollectionSchema;

/// Holds the schema of every collection created so far.
pub trait SchemaRegistry: Debug + Send + Sync {
    /// Register a schema under its table name, replacing any previous one.
    fn register(&self, schema: CollectionSchema) -> Arc<CollectionSchema>;

    fn lookup(&self, table_name: &str) -> Option<Arc<CollectionSchema>>;

    fn unregister(&self, table_name: &str) -> Option<Arc<CollectionSchema>>;
}

/// A registry kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySchemaRegistry {
    schemas: RwLock<BTreeMap<String, Arc<CollectionSchema>>>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the given schemas.
    pub fn with_schemas(schemas: impl IntoIterator<Item = CollectionSchema>) -> Self {
        let registry = Self::new();
        for schema in schemas {
            registry.register(schema);
        }
        registry
    }

    pub fn table_names(&self) -> Vec<String> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn register(&self, schema: CollectionSchema) -> Arc<CollectionSchema> {
        let schema = Arc::new(schema);
        self.schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(schema.table_name.clone(), schema.clone());
        schema
    }

    fn lookup(&self, table_name: &str) -> Option<Arc<CollectionSchema>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table_name)
            .cloned()
    }

    fn unregister(&self, table_name: &str) -> Option<Arc<CollectionSchema>> {
        self.schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(table_name)
    }
}
