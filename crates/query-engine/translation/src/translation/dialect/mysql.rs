//! MySQL: `JSON_*` functions, `JSON_TABLE` expansion and `REGEXP_LIKE`.

use query_engine_metadata::metadata::LogicalType;
use query_engine_sql::sql;
use query_engine_sql::sql::ast::Function;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::helpers::{cast, coalesce, equals, function, string_literal};
use query_engine_sql::sql::string::Param;

use super::{intermediate_prefixes, path_expression, DialectOps};
use crate::translation::error::Error;
use crate::translation::fields::JsonPath;
use crate::translation::helpers::PathBinding;
use crate::translation::values::ValueKind;

#[derive(Debug, Clone, Copy)]
pub struct Mysql;

/// JSON `true` or `false` from a bound boolean. `CAST(1 AS JSON)` would be the number 1.
fn json_boolean(value: sql::ast::Expression) -> sql::ast::Expression {
    function(
        Function::If,
        vec![
            value,
            cast(string_literal("true"), "JSON"),
            cast(string_literal("false"), "JSON"),
        ],
    )
}

impl DialectOps for Mysql {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn json_scalar(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        kind: ValueKind,
        paths: PathBinding,
    ) -> sql::ast::Expression {
        let extracted = self.json_value(document, path, paths);
        match kind {
            ValueKind::Text | ValueKind::Null => function(Function::JsonUnquote, vec![extracted]),
            ValueKind::Numeric | ValueKind::Boolean | ValueKind::Json => extracted,
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
        function(
            Function::JsonExtract,
            vec![document, path_expression(path.to_dollar_path(), paths)],
        )
    }

    // JSON_SET only creates the last key, so missing parents are set first, in the same call.
    fn json_set(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        value: sql::ast::Expression,
    ) -> sql::ast::Expression {
        let mut args = vec![document.clone()];
        for (prefix, next) in intermediate_prefixes(path) {
            let existing = self.json_value(document.clone(), &prefix, PathBinding::Parameter);
            args.push(path_expression(prefix.to_dollar_path(), PathBinding::Parameter));
            args.push(coalesce(existing, self.empty_container(Some(next))));
        }
        args.push(path_expression(path.to_dollar_path(), PathBinding::Parameter));
        args.push(value);
        function(Function::JsonSet, args)
    }

    fn json_remove(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
    ) -> sql::ast::Expression {
        function(
            Function::JsonRemove,
            vec![
                document,
                path_expression(path.to_dollar_path(), PathBinding::Parameter),
            ],
        )
    }

    fn to_json(&self, value: sql::ast::Expression, kind: ValueKind) -> sql::ast::Expression {
        match kind {
            ValueKind::Json => cast(value, "JSON"),
            ValueKind::Boolean => json_boolean(value),
            ValueKind::Null | ValueKind::Numeric | ValueKind::Text => value,
        }
    }

    fn json_equals(
        &self,
        left: sql::ast::Expression,
        document: sql::ast::Expression,
    ) -> sql::ast::Expression {
        equals(left, cast(document, "JSON"))
    }

    fn comparable(&self, value: sql::ast::Expression, kind: ValueKind) -> sql::ast::Expression {
        match kind {
            ValueKind::Boolean => json_boolean(value),
            _ => value,
        }
    }

    fn empty_object(&self) -> sql::ast::Expression {
        function(Function::JsonObject, vec![])
    }

    fn empty_array(&self) -> sql::ast::Expression {
        function(Function::JsonArray, vec![])
    }

    fn array_elements(
        &self,
        array: sql::ast::Expression,
        alias: sql::ast::TableAlias,
    ) -> sql::ast::From {
        sql::ast::From::JsonTable {
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
        match kind {
            ValueKind::Json => equals(element, cast(value, "JSON")),
            ValueKind::Text => equals(function(Function::JsonUnquote, vec![element]), value),
            ValueKind::Null => equals(element, cast(string_literal("null"), "JSON")),
            ValueKind::Boolean | ValueKind::Numeric => equals(element, self.comparable(value, kind)),
        }
    }

    fn array_length(&self, array: sql::ast::Expression) -> sql::ast::Expression {
        function(Function::JsonLength, vec![array])
    }

    fn array_append(
        &self,
        array: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression {
        function(
            Function::JsonArrayAppend,
            vec![array, string_literal("$"), self.to_json(value, kind)],
        )
    }

    fn array_aggregate(&self, element: sql::ast::Expression) -> sql::ast::Expression {
        coalesce(
            function(Function::JsonArrayAgg, vec![element]),
            self.empty_array(),
        )
    }

    fn regex(
        &self,
        target: sql::ast::Expression,
        pattern: &str,
        options: &str,
    ) -> Result<sql::ast::Expression, Error> {
        let mut match_type = String::from(if options.contains('i') { "i" } else { "c" });
        for option in options.chars() {
            match option {
                'i' => {}
                'm' => match_type.push('m'),
                // dot matches line terminators
                's' => match_type.push('n'),
                other => {
                    return Err(Error::UnsupportedOperator {
                        operator: format!("$options '{other}'"),
                        dialect: Dialect::Mysql,
                    })
                }
            }
        }
        Ok(function(
            Function::RegexpLike,
            vec![
                target,
                sql::helpers::param(Param::String(pattern.to_string())),
                string_literal(&match_type),
            ],
        ))
    }

    fn column_type(&self, logical_type: LogicalType, primary_key: bool) -> String {
        match logical_type {
            LogicalType::String if primary_key => "VARCHAR(255)",
            LogicalType::String => "TEXT",
            LogicalType::Date => "VARCHAR(64)",
            LogicalType::Integer => "BIGINT",
            LogicalType::Number => "DOUBLE",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::Object | LogicalType::Array | LogicalType::Any => "JSON",
        }
        .to_string()
    }

    fn supports_partial_indexes(&self) -> bool {
        false
    }

    fn supports_mutation_limit(&self) -> bool {
        true
    }

    fn index_expression(&self, expression: sql::ast::Expression) -> sql::ast::Expression {
        cast(expression, "CHAR(255)")
    }
}
