//! Translate update documents into a single `UPDATE` statement.
//!
//! Operator groups are applied in a fixed order. When several of them touch the same column,
//! each new expression is built over the previous one, so the column is assigned once.

use query_engine_metadata::metadata::{Document, FieldDefinition, LogicalType, ID_FIELD};
use query_engine_sql::sql;
use query_engine_sql::sql::ast::BinaryOperator;
use serde_json::Value;

use super::{restrict_to_scope, MutationScope};
use crate::translation::error::Error;
use crate::translation::fields::{split_field_name, JsonPath, PathSegment};
use crate::translation::helpers::{Env, PathBinding, State};
use crate::translation::query::filtering::{is_operator_map, translate_filter};
use crate::translation::query::operators::{element_value, translate_operators};
use crate::translation::values::{
    is_extended_json, serialize_json_column_value, serialize_value, translate_json_value,
    ValueKind,
};

/// Supported update operators, in the order they are applied.
pub const UPDATE_OPERATORS: [&str; 9] = [
    "$set",
    "$inc",
    "$mul",
    "$unset",
    "$min",
    "$max",
    "$push",
    "$pull",
    "$addToSet",
];

/// `UPDATE table SET .. [WHERE ..]`
pub fn translate_update(
    env: &Env,
    table: &str,
    update: &Document,
    filter: &Document,
    scope: MutationScope,
) -> Result<sql::ast::Update, Error> {
    if update.is_empty() {
        return Err(Error::MalformedUpdate("the update document is empty".to_string()));
    }
    if let Some(key) = update.keys().find(|key| !key.starts_with('$')) {
        return Err(Error::MalformedUpdate(format!(
            "'{key}' is not an update operator; replacing whole documents is not supported"
        )));
    }
    if let Some(operator) = update
        .keys()
        .find(|key| !UPDATE_OPERATORS.contains(&key.as_str()))
    {
        return Err(env.unsupported(operator));
    }

    let mut state = State::new();
    let mut assignments = Assignments::default();

    for operator in UPDATE_OPERATORS {
        let Some(fields) = update.get(operator) else {
            continue;
        };
        let fields = fields.as_object().ok_or_else(|| {
            Error::MalformedUpdate(format!("{operator} expects a document, got {fields}"))
        })?;
        for (name, value) in fields {
            let target = resolve_update_target(env, name)?;
            let current = assignments.current(&target.column);
            let updated = match operator {
                "$set" => set(env, &target, current, value)?,
                "$inc" => arithmetic(env, &target, current, value, operator, BinaryOperator::Plus)?,
                "$mul" => {
                    arithmetic(env, &target, current, value, operator, BinaryOperator::Multiply)?
                }
                "$unset" => unset(env, &target, current),
                "$min" => bound(env, &target, current, value, operator, BinaryOperator::GreaterThan)?,
                "$max" => bound(env, &target, current, value, operator, BinaryOperator::LessThan)?,
                "$push" => push(env, &target, current, value, operator)?,
                "$pull" => pull(env, &mut state, &target, current, value, operator)?,
                _ => add_to_set(env, &mut state, &target, current, value, operator)?,
            };
            assignments.assign(&target.column, updated);
        }
    }

    if assignments.0.is_empty() {
        return Err(Error::MalformedUpdate("the update changes no fields".to_string()));
    }

    let table = sql::ast::TableName(table.to_string());
    let condition = translate_filter(env, &mut state, filter)?;
    let (condition, limit) = restrict_to_scope(env, &table, condition, scope);

    Ok(sql::ast::Update {
        table,
        set: assignments
            .0
            .into_iter()
            .map(|(column, value)| (sql::ast::ColumnName(column), value))
            .collect(),
        where_: sql::ast::Where(condition),
        limit,
    })
}

/// Column assignments, in the order the columns were first touched.
#[derive(Debug, Default)]
struct Assignments(Vec<(String, sql::ast::Expression)>);

impl Assignments {
    /// The value of a column after the assignments made so far.
    fn current(&self, column: &str) -> sql::ast::Expression {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| sql::helpers::column(column))
    }

    fn assign(&mut self, column: &str, value: sql::ast::Expression) {
        match self.0.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((column.to_string(), value)),
        }
    }
}

/// The column an updated field lives in, and where inside it.
#[derive(Debug)]
struct UpdateTarget {
    column: String,
    /// Empty when the whole column is updated.
    path: JsonPath,
    /// The dotted field name.
    field: String,
    definition: Option<FieldDefinition>,
    is_array: bool,
}

fn resolve_update_target(env: &Env, name: &str) -> Result<UpdateTarget, Error> {
    let segments = split_field_name(name).map_err(Error::MalformedUpdate)?;
    let (root, rest) = segments
        .split_first()
        .ok_or_else(|| Error::MalformedUpdate(format!("invalid field name '{name}'")))?;
    if *root == ID_FIELD {
        return Err(Error::MalformedUpdate(format!("cannot modify {ID_FIELD}")));
    }

    let declared = env.schema.and_then(|schema| schema.column(root)).cloned();
    let overflow = env
        .schema
        .and_then(|schema| schema.overflow_column.as_deref());
    let (column, mut path, mut definition, mut is_array) = match (declared, overflow) {
        (Some(definition), _) => {
            let is_array = definition.is_array;
            ((*root).to_string(), JsonPath::default(), Some(definition), is_array)
        }
        (None, Some(overflow)) => (
            overflow.to_string(),
            JsonPath(vec![PathSegment::Key((*root).to_string())]),
            None,
            env.is_hinted_array(root),
        ),
        (None, None) => (
            (*root).to_string(),
            JsonPath::default(),
            None,
            env.is_hinted_array(root),
        ),
    };

    let mut field = (*root).to_string();
    for segment in rest {
        if is_array {
            let index = segment.parse::<usize>().map_err(|_| {
                Error::MalformedUpdate(format!(
                    "cannot update '{name}': '{field}' is an array and positional updates are not supported"
                ))
            })?;
            path.push(PathSegment::Index(index));
            definition = None;
            is_array = false;
        } else {
            path.push(PathSegment::Key((*segment).to_string()));
            definition = env.definition(&format!("{field}.{segment}"));
            is_array = definition.as_ref().is_some_and(|d| d.is_array);
        }
        field = format!("{field}.{segment}");
    }

    Ok(UpdateTarget {
        column,
        path,
        field,
        definition,
        is_array,
    })
}

/// Whether the target is a whole column holding JSON, such as an untyped field.
fn holds_json(target: &UpdateTarget) -> bool {
    target.definition.as_ref().is_some_and(|d| !d.is_scalar)
}

/// The empty document a path is created in when the column is `NULL`.
fn empty_container(env: &Env, path: &JsonPath) -> sql::ast::Expression {
    env.dialect.empty_container(path.first())
}

/// Store a JSON value at the target's path, creating the document if needed.
fn store(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: sql::ast::Expression,
) -> sql::ast::Expression {
    env.dialect.json_set(
        sql::helpers::coalesce(current, empty_container(env, &target.path)),
        &target.path,
        value,
    )
}

fn set(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    let dialect = env.sql_dialect();
    if target.path.is_empty() {
        let param = match &target.definition {
            Some(definition) if !definition.is_scalar => serialize_json_column_value(dialect, value)?,
            _ => serialize_value(dialect, value)?,
        };
        return Ok(sql::helpers::param(param));
    }
    let kind = ValueKind::of(value);
    let value = env
        .dialect
        .to_json(translate_json_value(dialect, value)?, kind);
    Ok(store(env, target, current, value))
}

/// `$inc` and `$mul`. A missing field counts as 0.
fn arithmetic(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: &Value,
    operator_name: &str,
    operator: BinaryOperator,
) -> Result<sql::ast::Expression, Error> {
    if !value.is_number() {
        return Err(Error::MalformedUpdate(format!(
            "{operator_name} expects a number, got {value}"
        )));
    }
    let amount = translate_json_value(env.sql_dialect(), value)?;
    if target.path.is_empty() && !holds_json(target) {
        return Ok(sql::helpers::binary(
            sql::helpers::coalesce(current, sql::helpers::int_literal(0)),
            operator,
            amount,
        ));
    }
    if target.path.is_empty() {
        let existing = env.dialect.json_column_scalar(current, ValueKind::Numeric);
        let computed = sql::helpers::binary(
            sql::helpers::coalesce(existing, sql::helpers::int_literal(0)),
            operator,
            amount,
        );
        return Ok(env.dialect.to_json(computed, ValueKind::Numeric));
    }
    let existing = env.dialect.json_scalar(
        current.clone(),
        &target.path,
        ValueKind::Numeric,
        PathBinding::Parameter,
    );
    let computed = sql::helpers::binary(
        sql::helpers::coalesce(existing, sql::helpers::int_literal(0)),
        operator,
        amount,
    );
    Ok(store(
        env,
        target,
        current,
        env.dialect.to_json(computed, ValueKind::Numeric),
    ))
}

fn unset(env: &Env, target: &UpdateTarget, current: sql::ast::Expression) -> sql::ast::Expression {
    if target.path.is_empty() {
        sql::helpers::null()
    } else {
        env.dialect.json_remove(current, &target.path)
    }
}

/// `$min` replaces values greater than the bound, `$max` values less than it.
fn bound(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: &Value,
    operator_name: &str,
    replace_when: BinaryOperator,
) -> Result<sql::ast::Expression, Error> {
    let kind = ValueKind::of(value);
    if matches!(kind, ValueKind::Null | ValueKind::Json) {
        return Err(Error::MalformedUpdate(format!(
            "{operator_name} expects a scalar, got {value}"
        )));
    }
    let param = translate_json_value(env.sql_dialect(), value)?;

    if target.path.is_empty() && !holds_json(target) {
        return Ok(sql::helpers::case_when(
            sql::helpers::or(
                sql::helpers::binary(current.clone(), replace_when, param.clone()),
                sql::helpers::is_null(current.clone()),
            ),
            param,
            current,
        ));
    }
    if target.path.is_empty() {
        let existing = env.dialect.json_column_scalar(current.clone(), kind);
        let stored = serialize_json_column_value(env.sql_dialect(), value)?;
        return Ok(sql::helpers::case_when(
            sql::helpers::or(
                sql::helpers::binary(
                    existing.clone(),
                    replace_when,
                    env.dialect.comparable(param, kind),
                ),
                sql::helpers::is_null(existing),
            ),
            sql::helpers::param(stored),
            current,
        ));
    }

    let existing = env.dialect.json_scalar(
        current.clone(),
        &target.path,
        kind,
        PathBinding::Parameter,
    );
    Ok(sql::helpers::case_when(
        sql::helpers::or(
            sql::helpers::binary(
                existing.clone(),
                replace_when,
                env.dialect.comparable(param.clone(), kind),
            ),
            sql::helpers::is_null(existing),
        ),
        store(env, target, current.clone(), env.dialect.to_json(param, kind)),
        current,
    ))
}

/// The values of `$push` and `$addToSet`, with `{$each: [..]}` spread out.
fn each_values<'a>(env: &Env, operator_name: &str, value: &'a Value) -> Result<Vec<&'a Value>, Error> {
    match value {
        Value::Object(map) if map.contains_key("$each") => {
            if let Some(modifier) = map.keys().find(|key| key.as_str() != "$each") {
                return Err(if modifier.starts_with('$') {
                    env.unsupported(&format!("{operator_name} with {modifier}"))
                } else {
                    Error::MalformedUpdate(format!(
                        "unexpected field '{modifier}' next to $each"
                    ))
                });
            }
            match map.get("$each") {
                Some(Value::Array(values)) => Ok(values.iter().collect()),
                _ => Err(Error::MalformedUpdate(format!(
                    "$each expects an array, got {value}"
                ))),
            }
        }
        single => Ok(vec![single]),
    }
}

fn require_array(target: &UpdateTarget, operator_name: &str) -> Result<(), Error> {
    match &target.definition {
        Some(definition)
            if !target.is_array && definition.logical_type != LogicalType::Any =>
        {
            Err(Error::MalformedUpdate(format!(
                "{operator_name} requires an array, but '{}' is declared {:?}",
                target.field, definition.logical_type
            )))
        }
        _ => Ok(()),
    }
}

/// The array being updated, as a JSON expression.
fn array_expression(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
) -> sql::ast::Expression {
    if target.path.is_empty() {
        current
    } else {
        env.dialect
            .json_value(current, &target.path, PathBinding::Parameter)
    }
}

/// Store an updated array.
fn store_array(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    array: sql::ast::Expression,
) -> sql::ast::Expression {
    if target.path.is_empty() {
        array
    } else {
        store(env, target, current, env.dialect.to_json(array, ValueKind::Json))
    }
}

fn push(
    env: &Env,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: &Value,
    operator_name: &str,
) -> Result<sql::ast::Expression, Error> {
    require_array(target, operator_name)?;
    let mut array = sql::helpers::coalesce(
        array_expression(env, target, current.clone()),
        env.dialect.empty_array(),
    );
    for value in each_values(env, operator_name, value)? {
        let kind = ValueKind::of(value);
        array = env.dialect.array_append(
            array,
            translate_json_value(env.sql_dialect(), value)?,
            kind,
        );
    }
    Ok(store_array(env, target, current, array))
}

/// Append each value unless the array already holds it.
fn add_to_set(
    env: &Env,
    state: &mut State,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: &Value,
    operator_name: &str,
) -> Result<sql::ast::Expression, Error> {
    require_array(target, operator_name)?;
    let mut array = array_expression(env, target, current.clone());
    for value in each_values(env, operator_name, value)? {
        let kind = ValueKind::of(value);
        let param = translate_json_value(env.sql_dialect(), value)?;
        let alias = state.make_element_alias();
        let present = sql::helpers::exists(sql::helpers::select_one(
            env.dialect.array_elements(array.clone(), alias.clone()),
            env.dialect
                .element_equals(env.dialect.element(&alias), param.clone(), kind),
        ));
        let appended = env.dialect.array_append(
            sql::helpers::coalesce(array.clone(), env.dialect.empty_array()),
            param,
            kind,
        );
        array = sql::helpers::case_when(present, array, appended);
    }
    Ok(store_array(env, target, current, array))
}

/// Keep the elements that do not match: a literal, an operator map, or a document
/// matched field by field.
fn pull(
    env: &Env,
    state: &mut State,
    target: &UpdateTarget,
    current: sql::ast::Expression,
    value: &Value,
    operator_name: &str,
) -> Result<sql::ast::Expression, Error> {
    require_array(target, operator_name)?;
    let array = array_expression(env, target, current.clone());
    let alias = state.make_element_alias();
    let element = env.dialect.element(&alias);

    let matches = match value {
        Value::Object(map) if is_operator_map(map)? => {
            translate_operators(env, state, &element_value(element.clone()), map)?
        }
        Value::Object(map) if !map.is_empty() && !is_extended_json(map) => translate_filter(
            &env.element_scope(element.clone(), &target.field),
            state,
            map,
        )?,
        literal => env.dialect.element_equals(
            element.clone(),
            translate_json_value(env.sql_dialect(), literal)?,
            ValueKind::of(literal),
        ),
    };

    let remaining = sql::ast::Expression::CorrelatedSubSelect(Box::new(
        sql::helpers::select_expression(
            env.dialect.array_aggregate(element),
            env.dialect.array_elements(array.clone(), alias),
            sql::helpers::not(sql::helpers::coalesce(matches, sql::helpers::false_expr())),
        ),
    ));

    let missing = sql::helpers::is_null(array);
    Ok(if target.path.is_empty() {
        sql::helpers::case_when(missing, sql::helpers::null(), remaining)
    } else {
        sql::helpers::case_when(
            missing,
            current.clone(),
            env.dialect.json_set(
                current,
                &target.path,
                env.dialect.to_json(remaining, ValueKind::Json),
            ),
        )
    })
}
