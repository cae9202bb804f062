//! Translate a filter document into a boolean SQL expression.

use query_engine_metadata::metadata::Document;
use query_engine_sql::sql;
use serde_json::Value;

use super::operators::{self, Operator};
use crate::translation::error::Error;
use crate::translation::fields::{resolve_field, FieldTarget};
use crate::translation::helpers::{Env, State};
use crate::translation::values::is_extended_json;

/// Translate a filter. Every entry must hold; the empty filter is `TRUE`.
pub fn translate_filter(
    env: &Env,
    state: &mut State,
    filter: &Document,
) -> Result<sql::ast::Expression, Error> {
    let conditions = filter
        .iter()
        .map(|(key, value)| translate_entry(env, state, key, value))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::helpers::and_all(conditions))
}

fn translate_entry(
    env: &Env,
    state: &mut State,
    key: &str,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    match key {
        "$and" => Ok(sql::helpers::and_all(translate_sub_filters(
            env, state, key, value,
        )?)),
        "$or" => translate_disjunction(env, state, key, value),
        "$nor" => {
            let disjunction = translate_disjunction(env, state, key, value)?;
            Ok(negate(disjunction))
        }
        "$not" => match value {
            Value::Object(filter) => Ok(negate(translate_filter(env, state, filter)?)),
            _ => Err(Error::MalformedFilter(format!(
                "$not expects a filter document, got {value}"
            ))),
        },
        "$comment" => Ok(sql::helpers::true_expr()),
        operator if operator.starts_with('$') => Err(env.unsupported(operator)),
        field => translate_field(env, state, field, value),
    }
}

fn translate_disjunction(
    env: &Env,
    state: &mut State,
    key: &str,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    let alternatives = translate_sub_filters(env, state, key, value)?;
    if alternatives.contains(&sql::helpers::true_expr()) {
        return Ok(sql::helpers::true_expr());
    }
    Ok(sql::helpers::or_all(alternatives))
}

fn translate_sub_filters(
    env: &Env,
    state: &mut State,
    key: &str,
    value: &Value,
) -> Result<Vec<sql::ast::Expression>, Error> {
    let filters = match value {
        Value::Array(filters) if !filters.is_empty() => filters,
        _ => {
            return Err(Error::MalformedFilter(format!(
                "{key} expects a non-empty array of filters, got {value}"
            )))
        }
    };
    filters
        .iter()
        .map(|filter| match filter {
            Value::Object(filter) => translate_filter(env, state, filter),
            other => Err(Error::MalformedFilter(format!(
                "{key} expects filter documents, got {other}"
            ))),
        })
        .collect()
}

/// `NOT`, folding the constants.
pub(crate) fn negate(expression: sql::ast::Expression) -> sql::ast::Expression {
    if expression == sql::helpers::true_expr() {
        sql::helpers::false_expr()
    } else if expression == sql::helpers::false_expr() {
        sql::helpers::true_expr()
    } else {
        sql::helpers::not(expression)
    }
}

/// Translate the condition on one (possibly dotted) field.
pub(crate) fn translate_field(
    env: &Env,
    state: &mut State,
    name: &str,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    let target = resolve_field(env, name).map_err(Error::MalformedFilter)?;
    translate_condition(env, state, name, &target, value)
}

/// Either an operator map or a literal the field must match.
pub(crate) fn translate_condition(
    env: &Env,
    state: &mut State,
    name: &str,
    target: &FieldTarget,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    match value {
        Value::Object(map) if is_operator_map(map)? => {
            operators::translate_operators(env, state, target, map)
        }
        Value::Object(map) if !map.is_empty() && !is_extended_json(map) => {
            translate_embedded_document(env, state, name, target, value, map)
        }
        literal => operators::apply(env, state, target, &Operator::Eq(literal)),
    }
}

/// `{address: {city: "Oslo"}}` matches field by field on documents, and is
/// whole-value equality on declared scalars.
fn translate_embedded_document(
    env: &Env,
    state: &mut State,
    name: &str,
    target: &FieldTarget,
    value: &Value,
    document: &Document,
) -> Result<sql::ast::Expression, Error> {
    let field_by_field = match target {
        FieldTarget::Column { definition, .. } | FieldTarget::Nested { definition, .. } => {
            !definition.as_ref().is_some_and(|d| d.is_scalar)
        }
        // arrays match some element field by field
        FieldTarget::Array { .. } => false,
    };
    if !field_by_field {
        return operators::apply(env, state, target, &Operator::Eq(value));
    }

    let conditions = document
        .iter()
        .map(|(key, value)| translate_field(env, state, &format!("{name}.{key}"), value))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::helpers::and_all(conditions))
}

/// Whether an object is a map of operators. Objects mixing operators and fields are malformed.
pub(crate) fn is_operator_map(map: &Document) -> Result<bool, Error> {
    if is_extended_json(map) {
        return Ok(false);
    }
    let operators = map.keys().filter(|key| key.starts_with('$')).count();
    if operators == 0 {
        Ok(false)
    } else if operators == map.len() {
        Ok(true)
    } else {
        Err(Error::MalformedFilter(format!(
            "cannot mix operators and fields in {}",
            Value::Object(map.clone())
        )))
    }
}
