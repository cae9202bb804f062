//! Configuration for the document store.

use std::collections::BTreeMap;

use query_engine_sql::sql::dialect::Dialect;
use query_engine_translation::translation::helpers::TranslationOptions;

use crate::values::PoolSettings;

/// The 'Configuration' type collects all the information necessary to open a store at runtime.
///
/// 'ParsedConfiguration' is what the configuration file says, secrets included as references to
/// environment variables. Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', once those references are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub dialect: Dialect,
    pub connection_uri: String,
    pub pool_settings: PoolSettings,
    pub translation_options: TranslationOptions,
    /// Collections to create when the store opens, by name, with their JSON Schema.
    pub collections: BTreeMap<String, serde_json::Value>,
}
