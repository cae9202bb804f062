//! Turn relational rows back into documents, and apply find projections to them.

use query_engine_metadata::metadata::{
    CollectionSchema, Document, FieldDefinition, LogicalType, ID_FIELD,
};
use serde_json::Value;

use crate::error::Error;
use crate::executor::Row;

/// Reconstruct the document stored in a row.
///
/// NULL columns are left out. JSON columns are parsed, boolean columns stored as integers are
/// coerced back, integral values of number columns come back as integers, and the keys of the overflow column are merged into the top level without
/// overriding declared columns. Without a schema, only the hinted array fields are parsed.
pub fn materialize_row(
    row: Row,
    schema: Option<&CollectionSchema>,
    array_field_hints: &[String],
) -> Document {
    let overflow = schema.and_then(|schema| schema.overflow_column.as_deref());
    let mut document = Document::new();
    let mut overflow_fields = None;

    for (column, value) in row {
        if value.is_null() {
            continue;
        }
        if overflow == Some(column.as_str()) {
            overflow_fields = Some(decode_json(&column, value, true));
            continue;
        }
        let value = match schema.and_then(|schema| schema.column(&column)) {
            Some(definition) => decode_column(&column, definition, value),
            None if schema.is_none() && array_field_hints.contains(&column) => {
                decode_json(&column, value, false)
            }
            None => value,
        };
        document.insert(column, value);
    }

    match overflow_fields {
        Some(Value::Object(fields)) => {
            for (key, value) in fields {
                if !document.contains_key(&key) {
                    document.insert(key, value);
                }
            }
        }
        Some(other) => {
            tracing::warn!(value = %other, "overflow column does not hold a document, ignoring it");
        }
        None => {}
    }

    drop_flattened_keys(&mut document);
    document
}

pub fn materialize_rows(
    rows: Vec<Row>,
    schema: Option<&CollectionSchema>,
    array_field_hints: &[String],
) -> Vec<Document> {
    rows.into_iter()
        .map(|row| materialize_row(row, schema, array_field_hints))
        .collect()
}

fn decode_column(column: &str, definition: &FieldDefinition, value: Value) -> Value {
    match (definition.logical_type, value) {
        (LogicalType::Boolean, Value::Number(n)) if n.as_i64() == Some(0) => Value::Bool(false),
        (LogicalType::Boolean, Value::Number(n)) if n.as_i64() == Some(1) => Value::Bool(true),
        (LogicalType::Number, Value::Number(n)) => Value::Number(integral(n)),
        (LogicalType::Object | LogicalType::Array, value) => decode_json(column, value, true),
        // scalars of text-stored JSON columns are JSON text as well
        (LogicalType::Any, Value::String(text)) if stored_as_text(definition) => {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        (LogicalType::Any, value) => decode_json(column, value, false),
        (_, value) => value,
    }
}

/// Floating point columns hand back `25` as `25.0`.
fn integral(number: serde_json::Number) -> serde_json::Number {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            serde_json::Number::from(f as i64)
        }
        _ => number,
    }
}

fn stored_as_text(definition: &FieldDefinition) -> bool {
    definition.column_type.eq_ignore_ascii_case("TEXT")
}

/// Parse JSON text, including JSON text that was encoded twice. With `strict`, text that is not
/// JSON is logged; either way it is returned unchanged.
fn decode_json(column: &str, value: Value, strict: bool) -> Value {
    let text = match value {
        Value::String(text) => text,
        other => return other,
    };
    if !strict && !looks_like_json(&text) {
        return Value::String(text);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::String(inner)) if looks_like_json(&inner) => {
            serde_json::from_str(&inner).unwrap_or(Value::String(inner))
        }
        Ok(parsed) => parsed,
        Err(err) => {
            if strict {
                tracing::warn!(column, error = %err, "column does not hold valid JSON");
            }
            Value::String(text)
        }
    }
}

fn looks_like_json(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with('{') || text.starts_with('[')
}

/// `parent.child` keys are stale copies when `parent` is a document.
fn drop_flattened_keys(document: &mut Document) {
    let flattened: Vec<String> = document
        .keys()
        .filter(|key| {
            key.split_once('.').is_some_and(|(parent, _)| {
                matches!(document.get(parent), Some(Value::Object(_)))
            })
        })
        .cloned()
        .collect();
    for key in flattened {
        document.shift_remove(&key);
    }
}

/// Apply an inclusion (`{a: 1}`) or exclusion (`{a: 0}`) projection. `_id` is kept unless
/// excluded.
pub fn apply_projection(document: Document, projection: &Document) -> Result<Document, Error> {
    if projection.is_empty() {
        return Ok(document);
    }

    let mut id_flag = None;
    let mut inclusions = vec![];
    let mut exclusions = vec![];
    for (path, flag) in projection {
        let included = match flag {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64() != Some(0.0),
            other => {
                return Err(Error::MalformedProjection(format!(
                    "'{path}' must be 0 or 1, got {other}"
                )))
            }
        };
        if path == ID_FIELD {
            id_flag = Some(included);
            continue;
        }
        if path.starts_with('$') || path.split('.').any(str::is_empty) {
            return Err(Error::MalformedProjection(format!(
                "'{path}' is not a field path"
            )));
        }
        let segments: Vec<&str> = path.split('.').collect();
        if included {
            inclusions.push(segments);
        } else {
            exclusions.push(segments);
        }
    }

    if !inclusions.is_empty() && !exclusions.is_empty() {
        return Err(Error::MalformedProjection(
            "cannot mix inclusion and exclusion".to_string(),
        ));
    }

    if !inclusions.is_empty() || (exclusions.is_empty() && id_flag == Some(true)) {
        let mut projected = Document::new();
        if id_flag != Some(false) {
            if let Some(id) = document.get(ID_FIELD) {
                projected.insert(ID_FIELD.to_string(), id.clone());
            }
        }
        for segments in &inclusions {
            include_path(&document, &mut projected, segments);
        }
        Ok(projected)
    } else {
        let mut document = document;
        if id_flag == Some(false) {
            document.shift_remove(ID_FIELD);
        }
        for segments in &exclusions {
            exclude_path(&mut document, segments);
        }
        Ok(document)
    }
}

fn include_path(source: &Document, target: &mut Document, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let Some(value) = source.get(*first) else {
        return;
    };
    if rest.is_empty() {
        target.insert((*first).to_string(), value.clone());
        return;
    }
    match value {
        Value::Object(child) => {
            let entry = target
                .entry(*first)
                .or_insert_with(|| Value::Object(Document::new()));
            if let Value::Object(child_target) = entry {
                include_path(child, child_target, rest);
            }
        }
        // every embedded document of the array is projected
        Value::Array(elements) => {
            let projected = elements.iter().filter_map(Value::as_object).map(|child| {
                let mut child_target = Document::new();
                include_path(child, &mut child_target, rest);
                Value::Object(child_target)
            });
            match target.get_mut(*first) {
                Some(Value::Array(existing)) => {
                    for (slot, projected) in existing.iter_mut().zip(projected) {
                        if let (Value::Object(slot), Value::Object(projected)) = (slot, projected) {
                            slot.extend(projected);
                        }
                    }
                }
                _ => {
                    target.insert((*first).to_string(), Value::Array(projected.collect()));
                }
            }
        }
        _ => {}
    }
}

fn exclude_path(document: &mut Document, segments: &[&str]) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        document.shift_remove(*first);
        return;
    }
    match document.get_mut(*first) {
        Some(Value::Object(child)) => exclude_path(child, rest),
        Some(Value::Array(elements)) => {
            for element in elements {
                if let Value::Object(child) = element {
                    exclude_path(child, rest);
                }
            }
        }
        _ => {}
    }
}
