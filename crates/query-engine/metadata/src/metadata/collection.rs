//! How a collection's documents are laid out in a table.

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The primary key of every collection.
pub const ID_FIELD: &str = "_id";

/// The overflow column holding undeclared fields when extra fields are enabled.
pub const EXTRA_FIELDS_COLUMN: &str = "_extra";

/// The single JSON column of collections created without a schema.
pub const DOCUMENT_COLUMN: &str = "data";

/// The logical type of a field, independent of the column type used to store it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Stored as ISO-8601 text.
    Date,
    /// Anything at all, stored as JSON.
    Any,
}

impl LogicalType {
    /// Scalar types are stored natively; the rest are stored as JSON.
    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            LogicalType::Object | LogicalType::Array | LogicalType::Any
        )
    }
}

/// A declared field. Top-level fields are columns; nested fields only describe JSON contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub logical_type: LogicalType,
    pub is_scalar: bool,
    /// The dialect-specific column type name.
    pub column_type: String,
    /// The dotted path of the field, e.g. `address.city`.
    pub path: String,
    pub is_array: bool,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new(path: &str, logical_type: LogicalType, column_type: String) -> Self {
        FieldDefinition {
            logical_type,
            is_scalar: logical_type.is_scalar(),
            column_type,
            path: path.to_string(),
            is_array: logical_type == LogicalType::Array,
            required: false,
        }
    }

    /// Whether this field is a column of its own rather than a path inside one.
    pub fn is_column(&self) -> bool {
        !self.path.contains('.')
    }
}

/// The registered layout of one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    pub table_name: String,
    /// Declared fields by dotted path, in declaration order.
    pub fields: IndexMap<String, FieldDefinition>,
    /// The JSON column that holds every undeclared field, if any.
    #[serde(default)]
    pub overflow_column: Option<String>,
}

impl CollectionSchema {
    pub fn new(table_name: &str) -> Self {
        CollectionSchema {
            table_name: table_name.to_string(),
            fields: IndexMap::new(),
            overflow_column: None,
        }
    }

    /// The legacy layout: an `_id` column and the whole document in a JSON `data` column.
    pub fn document_mode(table_name: &str, id_column_type: String, document_column_type: String) -> Self {
        let mut schema = CollectionSchema::new(table_name);
        schema.insert(FieldDefinition::new(
            ID_FIELD,
            LogicalType::String,
            id_column_type,
        ));
        schema.insert(FieldDefinition::new(
            DOCUMENT_COLUMN,
            LogicalType::Object,
            document_column_type,
        ));
        schema.overflow_column = Some(DOCUMENT_COLUMN.to_string());
        schema
    }

    pub fn insert(&mut self, field: FieldDefinition) {
        self.fields.insert(field.path.clone(), field);
    }

    pub fn has_overflow_column(&self) -> bool {
        self.overflow_column.is_some()
    }

    /// Look up a field by its exact dotted path.
    pub fn field(&self, path: &str) -> Option<&FieldDefinition> {
        self.fields.get(path)
    }

    /// Look up a declared column, i.e. a top-level field.
    pub fn column(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name).filter(|field| field.is_column())
    }

    /// The declared columns, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values().filter(|field| field.is_column())
    }
}
