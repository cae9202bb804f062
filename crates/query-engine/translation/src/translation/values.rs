//! Handle the translation of literal values.

use chrono::{DateTime, SecondsFormat, Utc};
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::string::Param;
use serde_json::Value;

use super::error::Error;

/// What a value looks like to SQL. Drives casts and JSON wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Numeric,
    Text,
    Json,
}

impl ValueKind {
    pub fn of(value: &Value) -> ValueKind {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Numeric,
            Value::String(_) => ValueKind::Text,
            Value::Object(map) if is_extended_json(map) => ValueKind::Text,
            Value::Object(_) | Value::Array(_) => ValueKind::Json,
        }
    }
}

/// Whether an object is an extended JSON scalar such as `{"$date": ...}` rather than a document.
pub fn is_extended_json(map: &serde_json::Map<String, Value>) -> bool {
    map.len() == 1 && map.contains_key("$date")
}

/// Convert a JSON value into a parameter we can bind.
pub fn serialize_value(dialect: Dialect, value: &Value) -> Result<Param, Error> {
    match value {
        Value::Null => Ok(Param::Null),
        Value::Bool(b) => Ok(Param::Bool(*b)),
        Value::Number(number) => serialize_number(number),
        Value::String(s) => Ok(Param::String(s.clone())),
        Value::Object(map) if is_extended_json(map) => Ok(Param::String(date_to_iso(&map["$date"])?)),
        Value::Object(_) | Value::Array(_) => {
            let document = normalize_dates(value)?;
            if dialect.binds_json_natively() {
                Ok(Param::Json(document))
            } else {
                serde_json::to_string(&document)
                    .map(Param::String)
                    .map_err(|err| Error::Serialization(err.to_string()))
            }
        }
    }
}

/// Convert a JSON value into a parameter for a JSON column. Scalars are stored as JSON too,
/// so `5`, `"5"` and `true` stay apart.
pub fn serialize_json_column_value(dialect: Dialect, value: &Value) -> Result<Param, Error> {
    let param = serialize_value(dialect, value)?;
    if !dialect.binds_json_natively() {
        return Ok(match param {
            Param::String(_) if ValueKind::of(value) == ValueKind::Json => param,
            Param::String(s) => Param::String(json_text(&Value::String(s))?),
            Param::Bool(b) => Param::String(b.to_string()),
            Param::Integer(i) => Param::String(i.to_string()),
            Param::Float(f) => Param::String(json_text(&Value::from(f))?),
            Param::Null | Param::Json(_) => param,
        });
    }
    Ok(match param {
        Param::String(s) => Param::Json(Value::String(s)),
        Param::Bool(b) => Param::Json(Value::Bool(b)),
        Param::Integer(i) => Param::Json(Value::from(i)),
        Param::Float(f) => Param::Json(Value::from(f)),
        Param::Null | Param::Json(_) => param,
    })
}

fn json_text(value: &Value) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|err| Error::Serialization(err.to_string()))
}

/// Convert a JSON value into a bound parameter expression.
pub fn translate_json_value(
    dialect: Dialect,
    value: &Value,
) -> Result<sql::ast::Expression, Error> {
    Ok(sql::helpers::param(serialize_value(dialect, value)?))
}

fn serialize_number(number: &serde_json::Number) -> Result<Param, Error> {
    if let Some(i) = number.as_i64() {
        Ok(Param::Integer(i))
    } else {
        match number.as_f64() {
            Some(f) if f.is_finite() => Ok(Param::Float(f)),
            _ => Err(Error::Serialization(format!(
                "number {number} is not representable"
            ))),
        }
    }
}

/// Replace every `{"$date": ...}` inside a document with its ISO-8601 string.
fn normalize_dates(value: &Value) -> Result<Value, Error> {
    match value {
        Value::Object(map) if is_extended_json(map) => Ok(Value::String(date_to_iso(&map["$date"])?)),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), normalize_dates(value)?)))
            .collect::<Result<serde_json::Map<_, _>, Error>>()
            .map(Value::Object),
        Value::Array(items) => items
            .iter()
            .map(normalize_dates)
            .collect::<Result<Vec<_>, Error>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Render the payload of a `$date` as UTC ISO-8601 with millisecond precision.
pub fn date_to_iso(payload: &Value) -> Result<String, Error> {
    let datetime: DateTime<Utc> = match payload {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|err| Error::Serialization(format!("invalid $date '{s}': {err}")))?
            .with_timezone(&Utc),
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| Error::Serialization(format!("invalid $date {n}")))?;
            from_millis(millis)?
        }
        Value::Object(map) => match map.get("$numberLong") {
            Some(Value::String(s)) if map.len() == 1 => {
                let millis = s
                    .parse::<i64>()
                    .map_err(|err| Error::Serialization(format!("invalid $date '{s}': {err}")))?;
                from_millis(millis)?
            }
            _ => return Err(Error::Serialization(format!("invalid $date {payload}"))),
        },
        _ => return Err(Error::Serialization(format!("invalid $date {payload}"))),
    };
    Ok(datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Serialization(format!("$date {millis} is out of range")))
}
