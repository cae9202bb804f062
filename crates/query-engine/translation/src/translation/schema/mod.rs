//! Translate a JSON Schema into a table layout and its `CREATE TABLE`.

pub mod index;

use query_engine_metadata::metadata::{
    CollectionSchema, Document, FieldDefinition, LogicalType, EXTRA_FIELDS_COLUMN, ID_FIELD,
};
use query_engine_sql::sql;
use serde_json::Value;

use super::error::Error;
use super::helpers::Env;

/// Derive the layout of a collection from its JSON Schema. Without properties, documents are
/// stored whole in a JSON column.
pub fn translate_schema(
    env: &Env,
    table: &str,
    json_schema: Option<&Value>,
) -> Result<(sql::ast::CreateTable, CollectionSchema), Error> {
    let json_schema = match json_schema {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(unwrap_validator(map)?),
        Some(other) => {
            return Err(Error::MalformedSchema(format!(
                "expected a JSON Schema document, got {other}"
            )))
        }
    };

    let properties = match json_schema.and_then(|schema| schema.get("properties")) {
        None => None,
        Some(Value::Object(properties)) => Some(properties),
        Some(other) => {
            return Err(Error::MalformedSchema(format!(
                "properties must be a document, got {other}"
            )))
        }
    };

    let schema = match (json_schema, properties) {
        (Some(json_schema), Some(properties)) => {
            collection_schema(env, table, json_schema, properties)?
        }
        _ => CollectionSchema::document_mode(
            table,
            env.dialect.column_type(LogicalType::String, true),
            env.dialect.column_type(LogicalType::Object, false),
        ),
    };

    Ok((create_table(env, &schema), schema))
}

/// `DROP TABLE IF EXISTS table`
pub fn translate_drop(table: &str) -> sql::ast::DropTable {
    sql::ast::DropTable {
        table: sql::ast::TableName(table.to_string()),
        if_exists: true,
    }
}

/// Accept MongoDB validators of the form `{$jsonSchema: {...}}`.
fn unwrap_validator(map: &Document) -> Result<&Document, Error> {
    match map.get("$jsonSchema") {
        None => Ok(map),
        Some(Value::Object(inner)) => Ok(inner),
        Some(other) => Err(Error::MalformedSchema(format!(
            "$jsonSchema must be a document, got {other}"
        ))),
    }
}

fn collection_schema(
    env: &Env,
    table: &str,
    json_schema: &Document,
    properties: &Document,
) -> Result<CollectionSchema, Error> {
    let required: Vec<&str> = match json_schema.get("required") {
        None => vec![],
        Some(Value::Array(names)) => names
            .iter()
            .map(|name| {
                name.as_str().ok_or_else(|| {
                    Error::MalformedSchema(format!("required must list field names, got {name}"))
                })
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(Error::MalformedSchema(format!(
                "required must be an array, got {other}"
            )))
        }
    };

    let mut schema = CollectionSchema::new(table);

    // the primary key always comes first
    let id_type = match properties.get(ID_FIELD) {
        Some(property) => logical_type(ID_FIELD, property)?,
        None => LogicalType::String,
    };
    schema.insert(FieldDefinition::new(
        ID_FIELD,
        id_type,
        env.dialect.column_type(id_type, true),
    ));

    for (name, property) in properties {
        if name == ID_FIELD {
            continue;
        }
        validate_property_name(name)?;
        register(env, &mut schema, name, property)?;
        if let Some(definition) = schema.fields.get_mut(name.as_str()) {
            definition.required = required.contains(&name.as_str());
        }
    }

    let overflow = match json_schema.get("additionalProperties") {
        None => env.options.extra_fields,
        Some(Value::Bool(allowed)) => *allowed,
        Some(Value::Object(_)) => true,
        Some(other) => {
            return Err(Error::MalformedSchema(format!(
                "additionalProperties must be a boolean or a schema, got {other}"
            )))
        }
    };
    if overflow {
        schema.overflow_column = Some(EXTRA_FIELDS_COLUMN.to_string());
    }

    Ok(schema)
}

/// Register a field and the fields of its nested documents and array elements.
fn register(
    env: &Env,
    schema: &mut CollectionSchema,
    path: &str,
    property: &Value,
) -> Result<(), Error> {
    let logical_type = logical_type(path, property)?;
    schema.insert(FieldDefinition::new(
        path,
        logical_type,
        env.dialect.column_type(logical_type, false),
    ));

    let nested = property
        .get("properties")
        .or_else(|| property.get("items").and_then(|items| items.get("properties")));
    match nested {
        None => Ok(()),
        Some(Value::Object(properties)) => {
            for (name, property) in properties {
                validate_property_name(name)?;
                register(env, schema, &format!("{path}.{name}"), property)?;
            }
            Ok(())
        }
        Some(other) => Err(Error::MalformedSchema(format!(
            "properties of '{path}' must be a document, got {other}"
        ))),
    }
}

fn validate_property_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.contains('.') || name.contains('"') || name.starts_with('$') {
        Err(Error::MalformedSchema(format!(
            "'{name}' cannot be used as a field name"
        )))
    } else {
        Ok(())
    }
}

/// The logical type of a property, from `bsonType` or `type`.
fn logical_type(path: &str, property: &Value) -> Result<LogicalType, Error> {
    let property = property.as_object().ok_or_else(|| {
        Error::MalformedSchema(format!("the schema of '{path}' must be a document"))
    })?;
    let format = property.get("format").and_then(Value::as_str);

    if let Some(bson_type) = property.get("bsonType") {
        return match first_type(path, bson_type)? {
            None => Ok(LogicalType::Any),
            Some("string" | "objectId") => Ok(LogicalType::String),
            Some("int" | "long") => Ok(LogicalType::Integer),
            Some("double" | "decimal") => Ok(LogicalType::Number),
            Some("bool") => Ok(LogicalType::Boolean),
            Some("date" | "timestamp") => Ok(LogicalType::Date),
            Some("object") => Ok(LogicalType::Object),
            Some("array") => Ok(LogicalType::Array),
            Some(other) => Err(Error::MalformedSchema(format!(
                "unknown bsonType '{other}' for '{path}'"
            ))),
        };
    }

    match property.get("type") {
        Some(json_type) => match first_type(path, json_type)? {
            None => Ok(LogicalType::Any),
            Some("string") if matches!(format, Some("date-time" | "date")) => Ok(LogicalType::Date),
            Some("string") => Ok(LogicalType::String),
            Some("integer") => Ok(LogicalType::Integer),
            Some("number") => Ok(LogicalType::Number),
            Some("boolean") => Ok(LogicalType::Boolean),
            Some("object") => Ok(LogicalType::Object),
            Some("array") => Ok(LogicalType::Array),
            Some(other) => Err(Error::MalformedSchema(format!(
                "unknown type '{other}' for '{path}'"
            ))),
        },
        None if property.contains_key("properties") => Ok(LogicalType::Object),
        None if property.contains_key("items") => Ok(LogicalType::Array),
        None => Ok(LogicalType::Any),
    }
}

/// A type name, or the first non-null one of a list. `None` when only `null` is allowed.
fn first_type<'a>(path: &str, types: &'a Value) -> Result<Option<&'a str>, Error> {
    match types {
        Value::String(name) if name == "null" => Ok(None),
        Value::String(name) => Ok(Some(name)),
        Value::Array(names) => {
            for name in names {
                match name.as_str() {
                    Some("null") => {}
                    Some(name) => return Ok(Some(name)),
                    None => {
                        return Err(Error::MalformedSchema(format!(
                            "types of '{path}' must be strings, got {name}"
                        )))
                    }
                }
            }
            Ok(None)
        }
        other => Err(Error::MalformedSchema(format!(
            "the type of '{path}' must be a string or a list, got {other}"
        ))),
    }
}

fn create_table(env: &Env, schema: &CollectionSchema) -> sql::ast::CreateTable {
    let mut columns: Vec<sql::ast::ColumnDefinition> = schema
        .columns()
        .map(|definition| {
            let primary_key = definition.path == ID_FIELD;
            sql::ast::ColumnDefinition {
                name: sql::ast::ColumnName(definition.path.clone()),
                r#type: sql::ast::ScalarType(definition.column_type.clone()),
                primary_key,
                not_null: definition.required && !primary_key,
            }
        })
        .collect();

    if let Some(overflow) = &schema.overflow_column {
        if schema.column(overflow).is_none() {
            columns.push(sql::ast::ColumnDefinition {
                name: sql::ast::ColumnName(overflow.clone()),
                r#type: sql::ast::ScalarType(env.dialect.column_type(LogicalType::Object, false)),
                primary_key: false,
                not_null: false,
            });
        }
    }

    sql::ast::CreateTable {
        table: sql::ast::TableName(schema.table_name.clone()),
        if_not_exists: true,
        columns,
    }
}
