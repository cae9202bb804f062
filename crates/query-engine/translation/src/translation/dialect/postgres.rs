//! PostgreSQL: jsonb operators, `jsonb_array_elements` expansion and POSIX regexes.

use query_engine_metadata::metadata::LogicalType;
use query_engine_sql::sql;
use query_engine_sql::sql::ast::{BinaryOperator, Function};
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::helpers::{binary, cast, coalesce, equals, function, string_literal};
use query_engine_sql::sql::string::Param;

use super::{intermediate_prefixes, path_expression, DialectOps};
use crate::translation::error::Error;
use crate::translation::fields::JsonPath;
use crate::translation::helpers::PathBinding;
use crate::translation::values::ValueKind;

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

fn text_array(path: &JsonPath, paths: PathBinding) -> sql::ast::Expression {
    cast(path_expression(path.to_text_array(), paths), "TEXT[]")
}

fn jsonb_set(
    document: sql::ast::Expression,
    path: &JsonPath,
    value: sql::ast::Expression,
) -> sql::ast::Expression {
    function(
        Function::JsonbSet,
        vec![
            document,
            text_array(path, PathBinding::Parameter),
            value,
            sql::ast::Expression::Value(sql::ast::Value::Bool(true)),
        ],
    )
}

impl DialectOps for Postgres {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn json_scalar(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        kind: ValueKind,
        paths: PathBinding,
    ) -> sql::ast::Expression {
        let text = binary(document, BinaryOperator::JsonPathGetText, text_array(path, paths));
        match kind {
            ValueKind::Numeric => cast(text, "NUMERIC"),
            ValueKind::Boolean => cast(text, "BOOLEAN"),
            ValueKind::Null | ValueKind::Text | ValueKind::Json => text,
        }
    }

    fn json_value(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        paths: PathBinding,
    ) -> sql::ast::Expression {
        if path.is_empty() {
            return document;
        }
        binary(document, BinaryOperator::JsonPathGet, text_array(path, paths))
    }

    // jsonb_set only creates the last key, so missing parents are filled in first.
    fn json_set(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        value: sql::ast::Expression,
    ) -> sql::ast::Expression {
        let mut updated = document.clone();
        for (prefix, next) in intermediate_prefixes(path) {
            let existing = binary(
                document.clone(),
                BinaryOperator::JsonPathGet,
                text_array(&prefix, PathBinding::Parameter),
            );
            updated = jsonb_set(
                updated,
                &prefix,
                coalesce(existing, self.empty_container(Some(next))),
            );
        }
        jsonb_set(updated, path, value)
    }

    fn json_remove(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
    ) -> sql::ast::Expression {
        binary(
            document,
            BinaryOperator::JsonPathRemove,
            text_array(path, PathBinding::Parameter),
        )
    }

    fn to_json(&self, value: sql::ast::Expression, kind: ValueKind) -> sql::ast::Expression {
        match kind {
            ValueKind::Null => cast(string_literal("null"), "JSONB"),
            // documents are bound as jsonb already
            ValueKind::Json => value,
            ValueKind::Boolean | ValueKind::Numeric | ValueKind::Text => {
                function(Function::ToJsonb, vec![value])
            }
        }
    }

    fn json_equals(
        &self,
        left: sql::ast::Expression,
        document: sql::ast::Expression,
    ) -> sql::ast::Expression {
        equals(left, cast(document, "JSONB"))
    }

    fn empty_object(&self) -> sql::ast::Expression {
        cast(string_literal("{}"), "JSONB")
    }

    fn empty_array(&self) -> sql::ast::Expression {
        cast(string_literal("[]"), "JSONB")
    }

    fn array_elements(
        &self,
        array: sql::ast::Expression,
        alias: sql::ast::TableAlias,
    ) -> sql::ast::From {
        sql::ast::From::JsonbArrayElements {
            expression: array,
            alias,
            column: sql::helpers::make_column_alias("value".to_string()),
        }
    }

    fn element_equals(
        &self,
        element: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression {
        equals(element, self.to_json(value, kind))
    }

    fn array_length(&self, array: sql::ast::Expression) -> sql::ast::Expression {
        function(Function::JsonbArrayLength, vec![array])
    }

    fn array_append(
        &self,
        array: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression {
        let value = match kind {
            ValueKind::Null => self.to_json(value, kind),
            _ => value,
        };
        binary(
            array,
            BinaryOperator::Concatenate,
            function(Function::JsonbBuildArray, vec![value]),
        )
    }

    fn array_aggregate(&self, element: sql::ast::Expression) -> sql::ast::Expression {
        coalesce(function(Function::JsonbAgg, vec![element]), self.empty_array())
    }

    fn regex(
        &self,
        target: sql::ast::Expression,
        pattern: &str,
        options: &str,
    ) -> Result<sql::ast::Expression, Error> {
        let mut embedded = String::new();
        let mut operator = BinaryOperator::Regex;
        for option in options.chars() {
            match option {
                'i' => operator = BinaryOperator::CaseInsensitiveRegex,
                'x' => embedded.push('x'),
                other => {
                    return Err(Error::UnsupportedOperator {
                        operator: format!("$options '{other}'"),
                        dialect: Dialect::Postgres,
                    })
                }
            }
        }
        let pattern = if embedded.is_empty() {
            pattern.to_string()
        } else {
            format!("(?{embedded}){pattern}")
        };
        Ok(binary(
            target,
            operator,
            sql::helpers::param(Param::String(pattern)),
        ))
    }

    fn column_type(&self, logical_type: LogicalType, _primary_key: bool) -> String {
        match logical_type {
            LogicalType::String | LogicalType::Date => "TEXT",
            LogicalType::Integer => "BIGINT",
            LogicalType::Number => "DOUBLE PRECISION",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::Object | LogicalType::Array | LogicalType::Any => "JSONB",
        }
        .to_string()
    }
}
