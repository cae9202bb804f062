//! What differs between dialects: JSON access and mutation, array expansion,
//! regular expressions and column types.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::fmt::Debug;

use query_engine_metadata::metadata::LogicalType;
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::string::Param;

use super::error::Error;
use super::fields::{JsonPath, PathSegment};
use super::helpers::PathBinding;
use super::values::ValueKind;

/// The capabilities every dialect provides to the translators.
pub trait DialectOps: Debug + Send + Sync {
    fn dialect(&self) -> Dialect;

    /// The value at `path` in a JSON document, comparable with bound values of `kind`.
    fn json_scalar(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        kind: ValueKind,
        paths: PathBinding,
    ) -> sql::ast::Expression;

    /// A whole JSON column as a scalar of the given kind.
    fn json_column_scalar(
        &self,
        column: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression {
        self.json_scalar(column, &JsonPath::default(), kind, PathBinding::Parameter)
    }

    /// The value at a non-empty `path` in a JSON document, as JSON.
    fn json_value(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        paths: PathBinding,
    ) -> sql::ast::Expression;

    /// The document with `value` stored at `path`. `value` comes from `to_json` or another JSON expression.
    fn json_set(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        value: sql::ast::Expression,
    ) -> sql::ast::Expression;

    fn json_remove(&self, document: sql::ast::Expression, path: &JsonPath)
        -> sql::ast::Expression;

    /// Wrap a value of `kind` so it is stored as JSON rather than as text.
    fn to_json(&self, value: sql::ast::Expression, kind: ValueKind) -> sql::ast::Expression;

    /// Whole-value equality between a JSON expression and a bound JSON document.
    fn json_equals(
        &self,
        left: sql::ast::Expression,
        document: sql::ast::Expression,
    ) -> sql::ast::Expression;

    /// Adjust a bound value so it compares with `json_scalar` of the same kind.
    fn comparable(&self, value: sql::ast::Expression, _kind: ValueKind) -> sql::ast::Expression {
        value
    }

    fn empty_object(&self) -> sql::ast::Expression;

    fn empty_array(&self) -> sql::ast::Expression;

    /// The empty array or object that `next` is looked up in.
    fn empty_container(&self, next: Option<&PathSegment>) -> sql::ast::Expression {
        match next {
            Some(PathSegment::Index(_)) => self.empty_array(),
            _ => self.empty_object(),
        }
    }

    /// One row per element of a JSON array.
    fn array_elements(
        &self,
        array: sql::ast::Expression,
        alias: sql::ast::TableAlias,
    ) -> sql::ast::From;

    /// The current element of `array_elements`, as JSON.
    fn element(&self, alias: &sql::ast::TableAlias) -> sql::ast::Expression {
        sql::helpers::aliased_column(alias, "value")
    }

    /// Whether an element equals a bound value of `kind`.
    fn element_equals(
        &self,
        element: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression;

    fn array_length(&self, array: sql::ast::Expression) -> sql::ast::Expression;

    fn array_append(
        &self,
        array: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression;

    /// Aggregate the elements of an expansion back into an array. Never NULL.
    fn array_aggregate(&self, element: sql::ast::Expression) -> sql::ast::Expression;

    /// Match text against a pattern. `options` only contains `imsx` flags.
    fn regex(
        &self,
        target: sql::ast::Expression,
        pattern: &str,
        options: &str,
    ) -> Result<sql::ast::Expression, Error>;

    fn column_type(&self, logical_type: LogicalType, primary_key: bool) -> String;

    fn supports_partial_indexes(&self) -> bool {
        true
    }

    /// Whether `UPDATE` and `DELETE` accept `LIMIT`.
    fn supports_mutation_limit(&self) -> bool {
        false
    }

    /// Make an expression indexable.
    fn index_expression(&self, expression: sql::ast::Expression) -> sql::ast::Expression {
        expression
    }
}

static SQLITE: sqlite::Sqlite = sqlite::Sqlite;
static POSTGRES: postgres::Postgres = postgres::Postgres;
static MYSQL: mysql::Mysql = mysql::Mysql;

/// The capabilities of a dialect.
pub fn for_dialect(dialect: Dialect) -> &'static dyn DialectOps {
    match dialect {
        Dialect::Sqlite => &SQLITE,
        Dialect::Postgres => &POSTGRES,
        Dialect::Mysql => &MYSQL,
    }
}

/// Each proper prefix of a path, with the segment that follows it.
pub(crate) fn intermediate_prefixes(path: &JsonPath) -> Vec<(JsonPath, &PathSegment)> {
    (1..path.0.len())
        .map(|length| (JsonPath(path.0[..length].to_vec()), &path.0[length]))
        .collect()
}

/// A path string, bound or inlined.
pub(crate) fn path_expression(path: String, paths: PathBinding) -> sql::ast::Expression {
    match paths {
        PathBinding::Parameter => sql::helpers::param(Param::String(path)),
        PathBinding::Inline => sql::helpers::string_literal(&path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_dialect_has_capabilities() {
        for dialect in enum_iterator::all::<Dialect>() {
            assert_eq!(for_dialect(dialect).dialect(), dialect);
        }
    }

    #[test]
    fn prefixes_know_what_follows_them() {
        let path = JsonPath::from_segments(&["address", "lines", "0", "text"]);
        let prefixes: Vec<(String, &PathSegment)> = intermediate_prefixes(&path)
            .into_iter()
            .map(|(prefix, next)| (prefix.to_dotted(), next))
            .collect();
        assert_eq!(
            prefixes,
            vec![
                ("address".to_string(), &PathSegment::Key("lines".to_string())),
                ("address.lines".to_string(), &PathSegment::Index(0)),
                ("address.lines.0".to_string(), &PathSegment::Key("text".to_string())),
            ]
        );
        assert!(intermediate_prefixes(&JsonPath::from_segments(&["city"])).is_empty());
    }

    #[test]
    fn every_logical_type_has_a_column_type() {
        for dialect in enum_iterator::all::<Dialect>() {
            for logical_type in enum_iterator::all::<LogicalType>() {
                assert!(!for_dialect(dialect)
                    .column_type(logical_type, false)
                    .is_empty());
            }
        }
    }
}
