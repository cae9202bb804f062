//! Translate field operators (`$gt`, `$in`, `$elemMatch`, ...) into conditions.

use query_engine_metadata::metadata::Document;
use query_engine_sql::sql;
use query_engine_sql::sql::ast::BinaryOperator;
use serde_json::Value;

use super::filtering::{is_operator_map, negate, translate_filter};
use crate::translation::error::Error;
use crate::translation::fields::{resolve_field, ArraySource, FieldTarget, JsonPath};
use crate::translation::helpers::{Env, State};
use crate::translation::values::{translate_json_value, ValueKind};

/// A field operator with validated arguments.
#[derive(Debug, Clone)]
pub enum Operator<'a> {
    Eq(&'a Value),
    Ne(&'a Value),
    Compare(BinaryOperator, &'a Value),
    In(&'a [Value]),
    Nin(&'a [Value]),
    Exists(bool),
    Regex { pattern: &'a str, options: &'a str },
    All(&'a [Value]),
    ElemMatch(&'a Document),
    Size(u64),
    Not(&'a Document),
}

impl<'a> Operator<'a> {
    fn parse(
        env: &Env,
        name: &str,
        argument: &'a Value,
        options: &'a str,
    ) -> Result<Operator<'a>, Error> {
        let malformed = |expected: &str| {
            Error::MalformedFilter(format!("{name} expects {expected}, got {argument}"))
        };
        Ok(match name {
            "$eq" => Operator::Eq(argument),
            "$ne" => Operator::Ne(argument),
            "$gt" => Operator::Compare(BinaryOperator::GreaterThan, argument),
            "$gte" => Operator::Compare(BinaryOperator::GreaterThanOrEqualTo, argument),
            "$lt" => Operator::Compare(BinaryOperator::LessThan, argument),
            "$lte" => Operator::Compare(BinaryOperator::LessThanOrEqualTo, argument),
            "$in" => Operator::In(argument.as_array().ok_or_else(|| malformed("an array"))?),
            "$nin" => Operator::Nin(argument.as_array().ok_or_else(|| malformed("an array"))?),
            "$all" => Operator::All(argument.as_array().ok_or_else(|| malformed("an array"))?),
            "$exists" => Operator::Exists(match argument {
                Value::Bool(exists) => *exists,
                Value::Number(n) if n.as_i64() == Some(0) => false,
                Value::Number(n) if n.as_i64() == Some(1) => true,
                _ => return Err(malformed("a boolean")),
            }),
            "$regex" => Operator::Regex {
                pattern: argument.as_str().ok_or_else(|| malformed("a string"))?,
                options,
            },
            "$size" => Operator::Size(
                argument
                    .as_u64()
                    .ok_or_else(|| malformed("a non-negative integer"))?,
            ),
            "$elemMatch" => {
                Operator::ElemMatch(argument.as_object().ok_or_else(|| malformed("a document"))?)
            }
            "$not" => Operator::Not(argument.as_object().ok_or_else(|| malformed("a document"))?),
            other => return Err(env.unsupported(other)),
        })
    }

    /// Operators that only make sense on arrays.
    fn requires_array(&self) -> bool {
        matches!(self, Operator::ElemMatch(_) | Operator::Size(_))
    }
}

/// Translate a map of operators on one field. All of them must hold.
pub fn translate_operators(
    env: &Env,
    state: &mut State,
    target: &FieldTarget,
    operators: &Document,
) -> Result<sql::ast::Expression, Error> {
    let options = match operators.get("$options") {
        None => "",
        Some(Value::String(options)) => {
            if !operators.contains_key("$regex") {
                return Err(Error::MalformedFilter(
                    "$options is only valid alongside $regex".to_string(),
                ));
            }
            if let Some(flag) = options.chars().find(|flag| !"imsx".contains(*flag)) {
                return Err(Error::MalformedFilter(format!(
                    "unknown regex option '{flag}'"
                )));
            }
            options
        }
        Some(other) => {
            return Err(Error::MalformedFilter(format!(
                "$options expects a string, got {other}"
            )))
        }
    };

    // validate everything before translating anything
    let parsed = operators
        .iter()
        .filter(|(name, _)| name.as_str() != "$options")
        .map(|(name, argument)| Operator::parse(env, name, argument, options))
        .collect::<Result<Vec<_>, Error>>()?;

    let conditions = parsed
        .iter()
        .map(|operator| apply(env, state, target, operator))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::helpers::and_all(conditions))
}

/// Apply one operator to a field.
pub fn apply(
    env: &Env,
    state: &mut State,
    target: &FieldTarget,
    operator: &Operator,
) -> Result<sql::ast::Expression, Error> {
    match operator {
        Operator::In(values) | Operator::All(values) if values.is_empty() => {
            return Ok(sql::helpers::false_expr())
        }
        Operator::Nin(values) if values.is_empty() => return Ok(sql::helpers::true_expr()),
        Operator::Not(operators) => {
            return Ok(negate(translate_operators(env, state, target, operators)?))
        }
        _ => {}
    }

    match target {
        FieldTarget::Array { array, remainder } if !remainder.is_empty() => {
            apply_to_elements(env, state, array, remainder, operator)
        }
        FieldTarget::Array { array, .. } => apply_to_array(env, state, array, operator),
        FieldTarget::Column { .. } | FieldTarget::Nested { .. } => {
            apply_to_value(env, state, target, operator)
        }
    }
}

/// A path through the elements of an array: some element must match, except for
/// negative operators, where no element may match.
fn apply_to_elements(
    env: &Env,
    state: &mut State,
    array: &ArraySource,
    remainder: &JsonPath,
    operator: &Operator,
) -> Result<sql::ast::Expression, Error> {
    let (negated, operator) = match operator {
        Operator::Ne(value) => (true, Operator::Eq(*value)),
        Operator::Nin(values) => (true, Operator::In(*values)),
        Operator::Exists(false) => (true, Operator::Exists(true)),
        other => (false, other.clone()),
    };
    let field = remainder.to_dotted();
    let condition = for_some_element(env, state, array, |env, state, element| {
        let element_env = env.element_scope(element, &array.prefix);
        let target = resolve_field(&element_env, &field).map_err(Error::MalformedFilter)?;
        apply(&element_env, state, &target, &operator)
    })?;
    Ok(if negated {
        negate(condition)
    } else {
        condition
    })
}

fn apply_to_array(
    env: &Env,
    state: &mut State,
    array: &ArraySource,
    operator: &Operator,
) -> Result<sql::ast::Expression, Error> {
    match operator {
        Operator::Eq(value) => array_equals(env, state, array, value),
        Operator::Ne(Value::Null) => Ok(sql::helpers::is_not_null(array.expression(env))),
        Operator::Ne(value) => Ok(negate(array_equals(env, state, array, value)?)),
        Operator::Compare(..) | Operator::In(_) | Operator::Regex { .. } => {
            for_some_element(env, state, array, |env, state, element| {
                apply_to_value(env, state, &element_value(element), operator)
            })
        }
        Operator::Nin(values) => Ok(negate(apply_to_array(
            env,
            state,
            array,
            &Operator::In(*values),
        )?)),
        Operator::Exists(true) => Ok(sql::helpers::is_not_null(array.expression(env))),
        Operator::Exists(false) => Ok(sql::helpers::is_null(array.expression(env))),
        Operator::All(values) => {
            let conditions = values
                .iter()
                .map(|value| contains(env, state, array, value))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(sql::helpers::and_all(conditions))
        }
        Operator::ElemMatch(query) => {
            if is_operator_map(query)? {
                for_some_element(env, state, array, |env, state, element| {
                    translate_operators(env, state, &element_value(element), query)
                })
            } else {
                for_some_element(env, state, array, |env, state, element| {
                    translate_filter(&env.element_scope(element, &array.prefix), state, query)
                })
            }
        }
        Operator::Size(size) => Ok(sql::helpers::equals(
            env.dialect.array_length(array.expression(env)),
            translate_json_value(env.sql_dialect(), &Value::from(*size))?,
        )),
        Operator::Not(operators) => Ok(negate(translate_operators(
            env,
            state,
            &FieldTarget::Array {
                array: array.clone(),
                remainder: JsonPath::default(),
            },
            operators,
        )?)),
    }
}

/// A column or a value inside a JSON document.
fn apply_to_value(
    env: &Env,
    state: &mut State,
    target: &FieldTarget,
    operator: &Operator,
) -> Result<sql::ast::Expression, Error> {
    if operator.requires_array() {
        if target.definition().is_some_and(|d| d.is_scalar) {
            return Err(Error::MalformedFilter(format!(
                "{} requires an array field",
                match operator {
                    Operator::Size(_) => "$size",
                    _ => "$elemMatch",
                }
            )));
        }
        let prefix = target
            .definition()
            .map(|definition| definition.path.clone())
            .unwrap_or_default();
        return match target.as_array(&prefix) {
            Some(array) => apply_to_array(env, state, &array, operator),
            None => Err(Error::MalformedFilter(
                "cannot treat this field as an array".to_string(),
            )),
        };
    }

    match operator {
        Operator::Eq(Value::Null) => Ok(sql::helpers::is_null(target.json(env))),
        Operator::Ne(Value::Null) => Ok(sql::helpers::is_not_null(target.json(env))),
        Operator::Eq(value) if ValueKind::of(value) == ValueKind::Json => {
            json_equals(env, target, value)
        }
        Operator::Ne(value) if ValueKind::of(value) == ValueKind::Json => {
            Ok(negate(json_equals(env, target, value)?))
        }
        Operator::Eq(value) => compare(env, target, BinaryOperator::Equals, value),
        Operator::Ne(value) => compare(env, target, BinaryOperator::NotEquals, value),
        Operator::Compare(operator, value) => compare(env, target, *operator, value),
        Operator::In(values) => in_list(env, target, values, false),
        Operator::Nin(values) => in_list(env, target, values, true),
        Operator::Exists(true) => Ok(sql::helpers::is_not_null(target.json(env))),
        Operator::Exists(false) => Ok(sql::helpers::is_null(target.json(env))),
        Operator::Regex { pattern, options } => {
            env.dialect
                .regex(target.scalar(env, ValueKind::Text), pattern, options)
        }
        Operator::All(values) => {
            let conditions = values
                .iter()
                .map(|value| apply_to_value(env, state, target, &Operator::Eq(value)))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(sql::helpers::and_all(conditions))
        }
        Operator::Not(operators) => Ok(negate(translate_operators(
            env, state, target, operators,
        )?)),
        Operator::ElemMatch(_) | Operator::Size(_) => Err(Error::MalformedFilter(
            "array operator on a non-array field".to_string(),
        )),
    }
}

/// Equality against a whole array: containment for primitives, one element matching
/// field by field for documents, whole-array equality for longer arrays.
fn array_equals(
    env: &Env,
    state: &mut State,
    array: &ArraySource,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    match value {
        Value::Null => Ok(sql::helpers::is_null(array.expression(env))),
        Value::Array(items) if items.len() == 1 && ValueKind::of(&items[0]) != ValueKind::Json => {
            contains(env, state, array, &items[0])
        }
        Value::Array(_) => Ok(env.dialect.json_equals(
            array.expression(env),
            translate_json_value(env.sql_dialect(), value)?,
        )),
        Value::Object(document) if ValueKind::of(value) == ValueKind::Json && !document.is_empty() => {
            for_some_element(env, state, array, |env, state, element| {
                translate_filter(&env.element_scope(element, &array.prefix), state, document)
            })
        }
        _ => contains(env, state, array, value),
    }
}

/// Some element of the array equals the value.
fn contains(
    env: &Env,
    state: &mut State,
    array: &ArraySource,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    let kind = ValueKind::of(value);
    let value = translate_json_value(env.sql_dialect(), value)?;
    for_some_element(env, state, array, |env, _state, element| {
        Ok(env.dialect.element_equals(element, value, kind))
    })
}

fn json_equals(
    env: &Env,
    target: &FieldTarget,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    Ok(env.dialect.json_equals(
        target.json(env),
        translate_json_value(env.sql_dialect(), value)?,
    ))
}

/// A comparison between a field and a scalar.
fn compare(
    env: &Env,
    target: &FieldTarget,
    operator: BinaryOperator,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    let kind = ValueKind::of(value);
    if matches!(kind, ValueKind::Null | ValueKind::Json) {
        return Err(Error::MalformedFilter(format!(
            "cannot compare with {value}"
        )));
    }
    Ok(sql::helpers::binary(
        target.scalar(env, kind),
        operator,
        comparable(env, target, value, kind)?,
    ))
}

/// A bound value, adjusted to compare with JSON when the target holds JSON.
fn comparable(
    env: &Env,
    target: &FieldTarget,
    value: &Value,
    kind: ValueKind,
) -> Result<sql::ast::Expression, Error> {
    let value = translate_json_value(env.sql_dialect(), value)?;
    Ok(if target.holds_json() {
        env.dialect.comparable(value, kind)
    } else {
        value
    })
}

/// `$in` and `$nin`. Values are grouped by kind so that each list compares like with like.
fn in_list(
    env: &Env,
    target: &FieldTarget,
    values: &[Value],
    negated: bool,
) -> Result<sql::ast::Expression, Error> {
    let mut lists: Vec<(ValueKind, Vec<sql::ast::Expression>)> = vec![];
    let mut conditions = vec![];

    for value in values {
        match ValueKind::of(value) {
            ValueKind::Null => conditions.push(if negated {
                sql::helpers::is_not_null(target.json(env))
            } else {
                sql::helpers::is_null(target.json(env))
            }),
            ValueKind::Json => {
                let equals = json_equals(env, target, value)?;
                conditions.push(if negated {
                    negate(equals)
                } else {
                    equals
                });
            }
            kind => {
                let value = comparable(env, target, value, kind)?;
                match lists.iter_mut().find(|(list_kind, _)| *list_kind == kind) {
                    Some((_, list)) => list.push(value),
                    None => lists.push((kind, vec![value])),
                }
            }
        }
    }

    let operator = if negated {
        sql::ast::BinaryArrayOperator::NotIn
    } else {
        sql::ast::BinaryArrayOperator::In
    };
    let mut all: Vec<sql::ast::Expression> = lists
        .into_iter()
        .map(|(kind, list)| sql::ast::Expression::BinaryArrayOperation {
            left: Box::new(target.scalar(env, kind)),
            operator,
            right: list,
        })
        .collect();
    all.extend(conditions);

    Ok(if negated {
        sql::helpers::and_all(all)
    } else {
        sql::helpers::or_all(all)
    })
}

/// The element itself, as a value to compare.
pub(crate) fn element_value(element: sql::ast::Expression) -> FieldTarget {
    FieldTarget::Nested {
        document: element,
        path: JsonPath::default(),
        definition: None,
    }
}

/// `EXISTS (SELECT 1 FROM <elements of array> WHERE <predicate on the element>)`.
pub(crate) fn for_some_element<F>(
    env: &Env,
    state: &mut State,
    array: &ArraySource,
    predicate: F,
) -> Result<sql::ast::Expression, Error>
where
    F: FnOnce(&Env, &mut State, sql::ast::Expression) -> Result<sql::ast::Expression, Error>,
{
    let alias = state.make_element_alias();
    let element = env.dialect.element(&alias);
    let condition = predicate(env, state, element)?;
    let from = env.dialect.array_elements(array.expression(env), alias);
    Ok(sql::helpers::exists(sql::helpers::select_one(from, condition)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::dialect;
    use crate::translation::helpers::TranslationOptions;
    use crate::translation::query::filtering::translate_filter;
    use query_engine_metadata::metadata::{CollectionSchema, FieldDefinition, LogicalType};
    use query_engine_sql::sql::dialect::Dialect;
    use query_engine_sql::sql::string::Param;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn users() -> CollectionSchema {
        let mut schema = CollectionSchema::new("users");
        for (path, logical_type) in [
            ("_id", LogicalType::String),
            ("name", LogicalType::String),
            ("age", LogicalType::Integer),
            ("active", LogicalType::Boolean),
            ("address", LogicalType::Object),
            ("tags", LogicalType::Array),
            ("skills", LogicalType::Array),
            ("skills.name", LogicalType::String),
            ("meta", LogicalType::Any),
        ] {
            schema.insert(FieldDefinition::new(path, logical_type, "TEXT".to_string()));
        }
        schema
    }

    fn render(dialect: Dialect, filter: Value) -> Result<(String, Vec<Param>), Error> {
        let schema = users();
        let options = TranslationOptions::default();
        let env = Env::new(dialect::for_dialect(dialect), Some(&schema), &options);
        let Value::Object(filter) = filter else {
            panic!("not a filter")
        };
        let expression = translate_filter(&env, &mut State::new(), &filter)?;
        let mut sql = sql::string::SQL::new(dialect);
        expression.to_sql(&mut sql);
        Ok((sql.sql, sql.params))
    }

    fn sqlite(filter: Value) -> String {
        render(Dialect::Sqlite, filter).unwrap().0
    }

    #[test]
    fn empty_in_matches_nothing_and_empty_nin_everything() {
        assert_eq!(sqlite(json!({"age": {"$in": []}})), "FALSE");
        assert_eq!(sqlite(json!({"age": {"$nin": []}})), "TRUE");
        assert_eq!(sqlite(json!({"tags": {"$in": []}})), "FALSE");
        assert_eq!(sqlite(json!({"skills.name": {"$nin": []}})), "TRUE");
    }

    #[test]
    fn in_with_null_also_matches_missing() {
        let (sql, params) = render(Dialect::Sqlite, json!({"age": {"$in": [1, null, 2]}})).unwrap();
        assert_eq!(sql, r#"("age" IN (?, ?) OR "age" IS NULL)"#);
        assert_eq!(params, vec![Param::Integer(1), Param::Integer(2)]);
    }

    #[test]
    fn in_on_array_checks_elements() {
        assert_eq!(
            sqlite(json!({"tags": {"$in": ["a", "b"]}})),
            r#"EXISTS (SELECT 1 FROM json_each("tags") AS "elem_0" WHERE "elem_0"."value" IN (?, ?))"#
        );
    }

    #[test]
    fn nin_on_array_is_negated() {
        assert_eq!(
            sqlite(json!({"tags": {"$nin": ["a"]}})),
            r#"NOT (EXISTS (SELECT 1 FROM json_each("tags") AS "elem_0" WHERE "elem_0"."value" IN (?)))"#
        );
    }

    #[test]
    fn path_through_elements() {
        let (sql, params) = render(Dialect::Sqlite, json!({"skills.name": "rust"})).unwrap();
        assert_eq!(
            sql,
            r#"EXISTS (SELECT 1 FROM json_each("skills") AS "elem_0" WHERE json_extract("elem_0"."value", ?) = ?)"#
        );
        assert_eq!(
            params,
            vec![
                Param::String("$.name".to_string()),
                Param::String("rust".to_string())
            ]
        );
        assert_eq!(
            sqlite(json!({"skills.name": {"$ne": "rust"}})),
            r#"NOT (EXISTS (SELECT 1 FROM json_each("skills") AS "elem_0" WHERE json_extract("elem_0"."value", ?) = ?))"#
        );
    }

    #[test]
    fn all_and_size() {
        assert_eq!(
            sqlite(json!({"tags": {"$all": ["a", "b"]}})),
            r#"(EXISTS (SELECT 1 FROM json_each("tags") AS "elem_0" WHERE "elem_0"."value" = ?) AND EXISTS (SELECT 1 FROM json_each("tags") AS "elem_1" WHERE "elem_1"."value" = ?))"#
        );
        assert_eq!(sqlite(json!({"tags": {"$all": []}})), "FALSE");
        assert_eq!(
            sqlite(json!({"tags": {"$size": 2}})),
            r#"json_array_length("tags") = ?"#
        );
    }

    #[test]
    fn elem_match_with_operators_and_with_fields() {
        assert_eq!(
            sqlite(json!({"tags": {"$elemMatch": {"$gte": "m"}}})),
            r#"EXISTS (SELECT 1 FROM json_each("tags") AS "elem_0" WHERE "elem_0"."value" >= ?)"#
        );
        assert_eq!(
            sqlite(json!({"skills": {"$elemMatch": {"name": "rust"}}})),
            r#"EXISTS (SELECT 1 FROM json_each("skills") AS "elem_0" WHERE json_extract("elem_0"."value", ?) = ?)"#
        );
    }

    #[test]
    fn exists() {
        assert_eq!(sqlite(json!({"name": {"$exists": true}})), r#""name" IS NOT NULL"#);
        assert_eq!(sqlite(json!({"name": {"$exists": 0}})), r#""name" IS NULL"#);
    }

    #[test]
    fn regex_per_dialect() {
        assert_eq!(
            render(Dialect::Sqlite, json!({"name": {"$regex": "^Al"}})).unwrap(),
            (
                r#""name" GLOB ?"#.to_string(),
                vec![Param::String("Al*".to_string())]
            )
        );
        assert_eq!(
            render(Dialect::Sqlite, json!({"name": {"$regex": "^al", "$options": "i"}})).unwrap(),
            (
                r#""name" LIKE ?"#.to_string(),
                vec![Param::String("al%".to_string())]
            )
        );
        assert_eq!(
            render(Dialect::Sqlite, json!({"name": {"$regex": "^5_", "$options": "i"}}))
                .unwrap()
                .0,
            r#""name" LIKE ? ESCAPE '\'"#
        );
        assert_eq!(
            render(Dialect::Postgres, json!({"name": {"$regex": "^al", "$options": "i"}}))
                .unwrap()
                .0,
            r#""name" ~* $1"#
        );
        assert_eq!(
            render(Dialect::Mysql, json!({"name": {"$regex": "^al", "$options": "is"}}))
                .unwrap()
                .0,
            "REGEXP_LIKE(`name`, ?, 'in')"
        );
    }

    #[test]
    fn mysql_booleans_compare_natively_with_boolean_columns() {
        let (sql, params) = render(Dialect::Mysql, json!({"active": true})).unwrap();
        assert_eq!(sql, "`active` = ?");
        assert_eq!(params, vec![Param::Bool(true)]);
        assert_eq!(
            render(Dialect::Mysql, json!({"active": {"$ne": false}})).unwrap().0,
            "`active` <> ?"
        );
        assert_eq!(
            render(Dialect::Mysql, json!({"active": {"$in": [true]}})).unwrap().0,
            "`active` IN (?)"
        );

        let (sql, params) = render(Dialect::Mysql, json!({"address.verified": true})).unwrap();
        assert_eq!(
            sql,
            "JSON_EXTRACT(`address`, ?) = IF(?, CAST('true' AS JSON), CAST('false' AS JSON))"
        );
        assert_eq!(
            params,
            vec![Param::String("$.verified".to_string()), Param::Bool(true)]
        );
    }

    #[test]
    fn untyped_columns_compare_their_json_scalar() {
        let (sql, params) = render(Dialect::Sqlite, json!({"meta": "5"})).unwrap();
        assert_eq!(sql, r#"json_extract("meta", '$') = ?"#);
        assert_eq!(params, vec![Param::String("5".to_string())]);
        assert_eq!(
            sqlite(json!({"meta": {"$gt": 3}})),
            r#"json_extract("meta", '$') > ?"#
        );
        assert_eq!(
            render(Dialect::Mysql, json!({"meta": "x"})).unwrap().0,
            "JSON_UNQUOTE(`meta`) = ?"
        );
        assert_eq!(
            render(Dialect::Mysql, json!({"meta": true})).unwrap().0,
            "`meta` = IF(?, CAST('true' AS JSON), CAST('false' AS JSON))"
        );
    }

    #[test]
    fn field_level_not() {
        assert_eq!(
            sqlite(json!({"age": {"$not": {"$gt": 3}}})),
            r#"NOT ("age" > ?)"#
        );
    }

    #[test]
    fn argument_validation() {
        for filter in [
            json!({"age": {"$in": 1}}),
            json!({"age": {"$exists": "yes"}}),
            json!({"tags": {"$size": -1}}),
            json!({"name": {"$regex": 1}}),
            json!({"name": {"$options": "i"}}),
            json!({"name": {"$regex": "a", "$options": "q"}}),
            json!({"tags": {"$elemMatch": 1}}),
            json!({"age": {"$size": 1}}),
            json!({"age": {"$gt": null}}),
        ] {
            assert!(
                matches!(render(Dialect::Sqlite, filter.clone()), Err(Error::MalformedFilter(_))),
                "{filter} should be malformed"
            );
        }
    }

    #[test]
    fn unsupported_regex_on_sqlite() {
        assert!(matches!(
            render(Dialect::Sqlite, json!({"name": {"$regex": "a+b"}})),
            Err(Error::UnsupportedOperator { .. })
        ));
    }
}
