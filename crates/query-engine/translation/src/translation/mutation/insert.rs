//! Translate inserts of one or more documents.

use indexmap::IndexMap;
use query_engine_metadata::metadata::{Document, ID_FIELD};
use query_engine_sql::sql;
use serde_json::Value;

use crate::translation::error::Error;
use crate::translation::helpers::Env;
use crate::translation::values::{serialize_json_column_value, serialize_value};

/// `INSERT INTO table (columns) VALUES (..), (..)`. Columns are the union of every document's
/// columns in order of first appearance; missing ones are `NULL`.
pub fn translate_insert(
    env: &Env,
    table: &str,
    documents: &[Document],
) -> Result<sql::ast::Insert, Error> {
    if documents.is_empty() {
        return Err(Error::MalformedDocument(
            "nothing to insert".to_string(),
        ));
    }

    let rows = documents
        .iter()
        .map(|document| document_row(env, document))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut columns: Vec<String> = vec![];
    for row in &rows {
        for column in row.keys() {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }

    let values = rows
        .into_iter()
        .map(|mut row| {
            columns
                .iter()
                .map(|column| {
                    row.shift_remove(column)
                        .unwrap_or_else(sql::helpers::null)
                })
                .collect()
        })
        .collect();

    Ok(sql::ast::Insert {
        table: sql::ast::TableName(table.to_string()),
        columns: columns.into_iter().map(sql::ast::ColumnName).collect(),
        values,
    })
}

/// The column values of one document.
fn document_row(
    env: &Env,
    document: &Document,
) -> Result<IndexMap<String, sql::ast::Expression>, Error> {
    match document.get(ID_FIELD) {
        None | Some(Value::Null) => {
            return Err(Error::MalformedDocument(format!(
                "document has no {ID_FIELD}"
            )))
        }
        Some(_) => {}
    }

    let dialect = env.sql_dialect();
    let overflow = env
        .schema
        .and_then(|schema| schema.overflow_column.as_deref());
    let mut row = IndexMap::new();
    let mut extra = Document::new();

    for (key, value) in document {
        if key.starts_with('$') {
            return Err(Error::MalformedDocument(format!(
                "field name '{key}' starts with '$'"
            )));
        }
        let declared = env.schema.and_then(|schema| schema.column(key));
        match (declared, overflow) {
            (Some(definition), _) => {
                let param = if definition.is_scalar {
                    serialize_value(dialect, value)?
                } else {
                    serialize_json_column_value(dialect, value)?
                };
                row.insert(key.clone(), sql::helpers::param(param));
            }
            (None, Some(_)) if key != ID_FIELD => {
                extra.insert(key.clone(), value.clone());
            }
            (None, _) => {
                row.insert(
                    key.clone(),
                    sql::helpers::param(serialize_value(dialect, value)?),
                );
            }
        }
    }

    if let Some(overflow) = overflow {
        if !extra.is_empty() {
            row.insert(
                overflow.to_string(),
                sql::helpers::param(serialize_value(dialect, &Value::Object(extra))?),
            );
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::dialect;
    use crate::translation::helpers::TranslationOptions;
    use query_engine_metadata::metadata::{CollectionSchema, FieldDefinition, LogicalType};
    use query_engine_sql::sql::dialect::Dialect;
    use query_engine_sql::sql::string::Param;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn documents(values: Vec<Value>) -> Vec<Document> {
        values
            .into_iter()
            .filter_map(|value| value.as_object().cloned())
            .collect()
    }

    fn render(
        schema: Option<&CollectionSchema>,
        values: Vec<Value>,
    ) -> Result<(String, Vec<Param>), Error> {
        let options = TranslationOptions::default();
        let env = Env::new(dialect::for_dialect(Dialect::Sqlite), schema, &options);
        let insert = translate_insert(&env, "users", &documents(values))?;
        let sql = sql::ast::Statement::Insert(insert).render(Dialect::Sqlite);
        Ok((sql.sql, sql.params))
    }

    #[test]
    fn arrays_are_stored_as_json_text() {
        let (sql, params) =
            render(None, vec![json!({"_id": "u1", "name": "Ann", "tags": ["a", "b"]})]).unwrap();
        assert_eq!(sql, r#"INSERT INTO "users" ("_id", "name", "tags") VALUES (?, ?, ?)"#);
        assert_eq!(
            params,
            vec![
                Param::String("u1".to_string()),
                Param::String("Ann".to_string()),
                Param::String(r#"["a","b"]"#.to_string()),
            ]
        );
    }

    #[test]
    fn undeclared_fields_go_to_the_overflow_column() {
        let mut schema = CollectionSchema::new("users");
        schema.insert(FieldDefinition::new("_id", LogicalType::String, "TEXT".to_string()));
        schema.insert(FieldDefinition::new("name", LogicalType::String, "TEXT".to_string()));
        schema.overflow_column = Some("_extra".to_string());

        let (sql, params) = render(
            Some(&schema),
            vec![
                json!({"_id": "u1", "nickname": "A", "name": "Ann"}),
                json!({"_id": "u2", "name": "Bob"}),
            ],
        )
        .unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "users" ("_id", "name", "_extra") VALUES (?, ?, ?), (?, ?, NULL)"#
        );
        assert_eq!(
            params,
            vec![
                Param::String("u1".to_string()),
                Param::String("Ann".to_string()),
                Param::String(r#"{"nickname":"A"}"#.to_string()),
                Param::String("u2".to_string()),
                Param::String("Bob".to_string()),
            ]
        );
    }

    #[test]
    fn missing_columns_are_null() {
        let (sql, _) = render(
            None,
            vec![json!({"_id": "a", "x": 1}), json!({"_id": "b", "y": 2})],
        )
        .unwrap();
        assert_eq!(
            sql,
            r#"INSERT INTO "users" ("_id", "x", "y") VALUES (?, ?, NULL), (?, NULL, ?)"#
        );
    }

    #[test]
    fn documents_need_an_id_and_plain_field_names() {
        assert!(matches!(
            render(None, vec![json!({"name": "Ann"})]),
            Err(Error::MalformedDocument(_))
        ));
        assert!(matches!(
            render(None, vec![json!({"_id": "a", "$set": 1})]),
            Err(Error::MalformedDocument(_))
        ));
    }
}
