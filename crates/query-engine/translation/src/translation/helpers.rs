//! Static and mutable context threaded through a translation.

use query_engine_metadata::metadata::{CollectionSchema, FieldDefinition};
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::Dialect;
use serde::{Deserialize, Serialize};

use super::dialect::DialectOps;
use super::error::Error;

/// Adapter-level switches that change how documents are laid out and matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOptions {
    /// Keep undeclared fields in an `_extra` JSON column.
    #[serde(default)]
    pub extra_fields: bool,
    /// Fields treated as arrays when no schema says otherwise.
    #[serde(default = "default_array_field_hints")]
    pub array_field_hints: Vec<String>,
}

pub fn default_array_field_hints() -> Vec<String> {
    vec!["tags".to_string(), "skills".to_string()]
}

impl Default for TranslationOptions {
    fn default() -> Self {
        TranslationOptions {
            extra_fields: false,
            array_field_hints: default_array_field_hints(),
        }
    }
}

/// How JSON paths reach the SQL text. DDL cannot bind parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathBinding {
    Parameter,
    Inline,
}

/// What field names refer to.
#[derive(Debug, Clone)]
pub enum Scope {
    /// The columns of the collection's table.
    Collection,
    /// The fields of one array element, e.g. inside `$elemMatch`.
    Element {
        element: sql::ast::Expression,
        /// The dotted path of the array, used to find declared element fields.
        prefix: String,
    },
}

/// Static information passed down the translation.
#[derive(Debug, Clone)]
pub struct Env<'a> {
    pub dialect: &'a dyn DialectOps,
    pub schema: Option<&'a CollectionSchema>,
    pub options: &'a TranslationOptions,
    /// Qualifies column references when set.
    pub table: Option<sql::ast::TableReference>,
    pub paths: PathBinding,
    pub scope: Scope,
}

impl<'a> Env<'a> {
    pub fn new(
        dialect: &'a dyn DialectOps,
        schema: Option<&'a CollectionSchema>,
        options: &'a TranslationOptions,
    ) -> Self {
        Env {
            dialect,
            schema,
            options,
            table: None,
            paths: PathBinding::Parameter,
            scope: Scope::Collection,
        }
    }

    /// The same environment, with field names referring to the fields of an array element.
    pub fn element_scope(&self, element: sql::ast::Expression, prefix: &str) -> Self {
        Env {
            scope: Scope::Element {
                element,
                prefix: prefix.to_string(),
            },
            ..self.clone()
        }
    }

    pub fn sql_dialect(&self) -> Dialect {
        self.dialect.dialect()
    }

    /// A reference to a column of the collection's table.
    pub fn column(&self, name: &str) -> sql::ast::Expression {
        let name = sql::ast::ColumnName(name.to_string());
        sql::ast::Expression::ColumnReference(match &self.table {
            None => sql::ast::ColumnReference::Column(name),
            Some(table) => sql::ast::ColumnReference::TableColumn {
                table: table.clone(),
                name,
            },
        })
    }

    pub fn definition(&self, path: &str) -> Option<FieldDefinition> {
        self.schema.and_then(|schema| schema.field(path)).cloned()
    }

    /// Whether an undeclared field is conventionally an array.
    pub fn is_hinted_array(&self, name: &str) -> bool {
        self.options
            .array_field_hints
            .iter()
            .any(|hint| hint == name)
    }

    pub fn unsupported(&self, operator: &str) -> Error {
        Error::UnsupportedOperator {
            operator: operator.to_string(),
            dialect: self.sql_dialect(),
        }
    }
}

/// Stateful information changed throughout the translation process.
#[derive(Debug, Default)]
pub struct State {
    next_element_alias: u64,
}

impl State {
    pub fn new() -> State {
        State::default()
    }

    /// A fresh alias for the rows of an array expansion.
    pub fn make_element_alias(&mut self) -> sql::ast::TableAlias {
        let alias = sql::helpers::make_table_alias(self.next_element_alias, "elem");
        self.next_element_alias += 1;
        alias
    }
}
