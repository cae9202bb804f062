//! SQLite: JSON1 functions, `json_each` expansion and `GLOB`/`LIKE` approximations of regexes.

use query_engine_metadata::metadata::LogicalType;
use query_engine_sql::sql;
use query_engine_sql::sql::ast::Function;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::helpers::{equals, function, string_literal};
use query_engine_sql::sql::string::Param;

use super::{path_expression, DialectOps};
use crate::translation::error::Error;
use crate::translation::fields::JsonPath;
use crate::translation::helpers::PathBinding;
use crate::translation::values::ValueKind;

#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl DialectOps for Sqlite {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    // json_extract already returns SQL-typed scalars.
    fn json_scalar(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        _kind: ValueKind,
        paths: PathBinding,
    ) -> sql::ast::Expression {
        self.json_value(document, path, paths)
    }

    // the column holds JSON text, so `"x"` has to be unquoted
    fn json_column_scalar(
        &self,
        column: sql::ast::Expression,
        _kind: ValueKind,
    ) -> sql::ast::Expression {
        function(Function::JsonExtract, vec![column, string_literal("$")])
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

    fn json_set(
        &self,
        document: sql::ast::Expression,
        path: &JsonPath,
        value: sql::ast::Expression,
    ) -> sql::ast::Expression {
        function(
            Function::JsonSet,
            vec![
                document,
                path_expression(path.to_dollar_path(), PathBinding::Parameter),
                value,
            ],
        )
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
            ValueKind::Json => function(Function::Json, vec![value]),
            // booleans would otherwise be stored as 1 and 0
            ValueKind::Boolean => function(
                Function::Json,
                vec![sql::helpers::case_when(
                    value,
                    string_literal("true"),
                    string_literal("false"),
                )],
            ),
            ValueKind::Null | ValueKind::Numeric | ValueKind::Text => value,
        }
    }

    fn json_equals(
        &self,
        left: sql::ast::Expression,
        document: sql::ast::Expression,
    ) -> sql::ast::Expression {
        equals(
            function(Function::Json, vec![left]),
            function(Function::Json, vec![document]),
        )
    }

    fn empty_object(&self) -> sql::ast::Expression {
        string_literal("{}")
    }

    fn empty_array(&self) -> sql::ast::Expression {
        string_literal("[]")
    }

    fn array_elements(
        &self,
        array: sql::ast::Expression,
        alias: sql::ast::TableAlias,
    ) -> sql::ast::From {
        sql::ast::From::JsonEach {
            expression: array,
            alias,
        }
    }

    fn element_equals(
        &self,
        element: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression {
        match kind {
            ValueKind::Json => equals(element, function(Function::Json, vec![value])),
            ValueKind::Null => sql::helpers::is_null(element),
            ValueKind::Boolean | ValueKind::Numeric | ValueKind::Text => equals(element, value),
        }
    }

    fn array_length(&self, array: sql::ast::Expression) -> sql::ast::Expression {
        function(Function::JsonArrayLength, vec![array])
    }

    fn array_append(
        &self,
        array: sql::ast::Expression,
        value: sql::ast::Expression,
        kind: ValueKind,
    ) -> sql::ast::Expression {
        function(
            Function::JsonInsert,
            vec![array, string_literal("$[#]"), self.to_json(value, kind)],
        )
    }

    fn array_aggregate(&self, element: sql::ast::Expression) -> sql::ast::Expression {
        function(Function::JsonGroupArray, vec![element])
    }

    fn regex(
        &self,
        target: sql::ast::Expression,
        pattern: &str,
        options: &str,
    ) -> Result<sql::ast::Expression, Error> {
        // LIKE ignores ASCII case and GLOB does not; m, s and x have no counterpart in either
        let syntax = if options.contains('i') {
            PatternSyntax::Like
        } else {
            PatternSyntax::Glob
        };
        let translated =
            regex_to_pattern(pattern, syntax).map_err(|construct| Error::UnsupportedOperator {
                operator: format!("$regex with {construct}"),
                dialect: Dialect::Sqlite,
            })?;
        let expression = Box::new(target);
        let pattern = Box::new(sql::helpers::param(Param::String(translated.pattern)));
        Ok(match syntax {
            PatternSyntax::Like => sql::ast::Expression::Like {
                expression,
                pattern,
                escape: translated.escaped.then_some('\\'),
            },
            PatternSyntax::Glob => sql::ast::Expression::Glob {
                expression,
                pattern,
            },
        })
    }

    fn column_type(&self, logical_type: LogicalType, _primary_key: bool) -> String {
        match logical_type {
            LogicalType::String | LogicalType::Date => "TEXT",
            LogicalType::Integer | LogicalType::Boolean => "INTEGER",
            LogicalType::Number => "REAL",
            LogicalType::Object | LogicalType::Array | LogicalType::Any => "TEXT",
        }
        .to_string()
    }
}

/// The SQLite operator a regex is approximated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSyntax {
    /// `%` and `_` wildcards, escaped with `\`. Case-insensitive for ASCII.
    Like,
    /// `*` and `?` wildcards, escaped with brackets. Case-sensitive.
    Glob,
}

/// A `LIKE` or `GLOB` pattern approximating a regex.
#[derive(Debug, PartialEq, Eq)]
pub struct SqlitePattern {
    pub pattern: String,
    /// Whether a `LIKE` pattern uses `\` to escape `%` or `_`.
    pub escaped: bool,
}

/// Translate anchors, `.*` and `.`; anything else that is not a literal is rejected.
pub fn regex_to_pattern(regex: &str, syntax: PatternSyntax) -> Result<SqlitePattern, String> {
    let (anchored_start, body) = match regex.strip_prefix('^') {
        Some(body) => (true, body),
        None => (false, regex),
    };
    let (anchored_end, body) = match body.strip_suffix('$') {
        Some(stripped) if !ends_with_escape(stripped) => (true, stripped),
        _ => (false, body),
    };

    let (any, one) = match syntax {
        PatternSyntax::Like => ('%', '_'),
        PatternSyntax::Glob => ('*', '?'),
    };
    let mut translated = SqlitePattern {
        pattern: String::new(),
        escaped: false,
    };
    if !anchored_start {
        translated.pattern.push(any);
    }

    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if ".^$*+?()[]{}|\\/".contains(escaped) => {
                    push_literal(&mut translated, syntax, escaped);
                }
                Some(other) => return Err(format!("'\\{other}'")),
                None => return Err("a trailing '\\'".to_string()),
            },
            '.' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    translated.pattern.push(any);
                } else {
                    translated.pattern.push(one);
                }
            }
            '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' => {
                return Err(format!("'{c}'"));
            }
            literal => push_literal(&mut translated, syntax, literal),
        }
    }

    if !anchored_end {
        translated.pattern.push(any);
    }
    Ok(translated)
}

/// Whether the text ends in an unescaped `\`, i.e. an odd run of backslashes.
fn ends_with_escape(text: &str) -> bool {
    text.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn push_literal(translated: &mut SqlitePattern, syntax: PatternSyntax, c: char) {
    match syntax {
        PatternSyntax::Like => {
            if matches!(c, '%' | '_' | '\\') {
                translated.pattern.push('\\');
                translated.escaped = true;
            }
            translated.pattern.push(c);
        }
        PatternSyntax::Glob => {
            if matches!(c, '*' | '?' | '[') {
                translated.pattern.push('[');
                translated.pattern.push(c);
                translated.pattern.push(']');
            } else {
                translated.pattern.push(c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(regex: &str) -> String {
        regex_to_pattern(regex, PatternSyntax::Like).unwrap().pattern
    }

    fn glob(regex: &str) -> String {
        regex_to_pattern(regex, PatternSyntax::Glob).unwrap().pattern
    }

    #[test]
    fn anchors_drop_wildcards() {
        assert_eq!(like("^Al"), "Al%");
        assert_eq!(like("son$"), "%son");
        assert_eq!(like("^exact$"), "exact");
        assert_eq!(like("mid"), "%mid%");
        assert_eq!(glob("^Al"), "Al*");
        assert_eq!(glob("mid"), "*mid*");
    }

    #[test]
    fn dots_become_wildcards() {
        assert_eq!(like("^a.*z$"), "a%z");
        assert_eq!(like("^a.c$"), "a_c");
        assert_eq!(glob("^a.*z$"), "a*z");
        assert_eq!(glob("^a.c$"), "a?c");
    }

    #[test]
    fn literals_are_escaped() {
        let pattern = regex_to_pattern("^100%_done\\.$", PatternSyntax::Like).unwrap();
        assert_eq!(pattern.pattern, "100\\%\\_done.");
        assert!(pattern.escaped);
        assert!(!regex_to_pattern("^plain", PatternSyntax::Like).unwrap().escaped);
        assert_eq!(glob("^what\\?\\*\\[$"), "what[?][*][[]");
    }

    #[test]
    fn escaped_dollars_are_literal_and_escaped_backslashes_are_not() {
        assert_eq!(like("^a\\$"), "a$%");
        assert_eq!(like("^a\\\\$"), "a\\\\");
        assert_eq!(glob("^a\\\\$"), "a\\");
        assert_eq!(glob("^a\\\\\\$"), "a\\$*");
    }

    #[test]
    fn real_regex_constructs_are_rejected() {
        for syntax in [PatternSyntax::Like, PatternSyntax::Glob] {
            assert!(regex_to_pattern("a+", syntax).is_err());
            assert!(regex_to_pattern("(a|b)", syntax).is_err());
            assert!(regex_to_pattern("[abc]", syntax).is_err());
            assert!(regex_to_pattern("\\d", syntax).is_err());
        }
    }
}
