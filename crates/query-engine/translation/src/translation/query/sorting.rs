//! Translate a sort document into an `ORDER BY` clause.

use query_engine_metadata::metadata::Document;
use query_engine_sql::sql;
use serde_json::Value;

use crate::translation::error::Error;
use crate::translation::fields::resolve_field;
use crate::translation::helpers::Env;

/// `{field: 1 | -1, ...}`, in key order. JSON paths sort by their JSON value.
pub fn translate_order_by(env: &Env, sort: &Document) -> Result<sql::ast::OrderBy, Error> {
    let elements = sort
        .iter()
        .map(|(name, direction)| {
            let direction = match direction {
                Value::Number(n) if n.as_i64() == Some(1) => sql::ast::OrderByDirection::Asc,
                Value::Number(n) if n.as_i64() == Some(-1) => sql::ast::OrderByDirection::Desc,
                _ => {
                    return Err(Error::MalformedFilter(format!(
                        "sort direction for '{name}' must be 1 or -1, got {direction}"
                    )))
                }
            };
            let target = resolve_field(env, name).map_err(Error::MalformedFilter)?;
            Ok(sql::ast::OrderByElement {
                target: target.json(env),
                direction,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::ast::OrderBy { elements })
}
