//! Translate index creation.

use query_engine_metadata::metadata::Document;
use query_engine_sql::sql;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::translation::error::Error;
use crate::translation::fields::{resolve_field, FieldTarget};
use crate::translation::helpers::{Env, PathBinding};
use crate::translation::values::ValueKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    #[serde(default)]
    pub unique: bool,
    /// Only index documents that have every indexed field.
    #[serde(default)]
    pub sparse: bool,
}

/// `CREATE [UNIQUE] INDEX name ON table (..)`, one element per `{field: 1 | -1}` entry.
pub fn translate_create_index(
    env: &Env,
    table: &str,
    name: &str,
    fields: &Document,
    options: &IndexOptions,
) -> Result<sql::ast::CreateIndex, Error> {
    if name.is_empty() {
        return Err(Error::MalformedIndex("index name is empty".to_string()));
    }
    if fields.is_empty() {
        return Err(Error::MalformedIndex(format!(
            "index '{name}' has no fields"
        )));
    }

    // paths cannot be bound parameters in DDL
    let env = Env {
        paths: PathBinding::Inline,
        ..env.clone()
    };

    let mut elements = vec![];
    for (field, direction) in fields {
        let direction = match direction {
            Value::Number(n) if n.as_i64() == Some(1) => sql::ast::OrderByDirection::Asc,
            Value::Number(n) if n.as_i64() == Some(-1) => sql::ast::OrderByDirection::Desc,
            other => {
                return Err(Error::MalformedIndex(format!(
                    "direction of '{field}' must be 1 or -1, got {other}"
                )))
            }
        };
        let target = resolve_field(&env, field).map_err(Error::MalformedIndex)?;
        elements.push(sql::ast::IndexElement {
            target: index_target(&env, field, &target)?,
            direction,
        });
    }

    let where_ = if !options.sparse {
        None
    } else if env.dialect.supports_partial_indexes() {
        Some(sql::ast::Where(sql::helpers::and_all(
            elements
                .iter()
                .map(|element| sql::helpers::is_not_null(element.target.clone()))
                .collect(),
        )))
    } else {
        tracing::warn!(
            index = name,
            dialect = %env.sql_dialect(),
            "partial indexes are not supported, creating a full index"
        );
        None
    };

    Ok(sql::ast::CreateIndex {
        name: sql::ast::IndexName(name.to_string()),
        table: sql::ast::TableName(table.to_string()),
        unique: options.unique,
        if_not_exists: true,
        elements,
        where_,
    })
}

fn index_target(
    env: &Env,
    field: &str,
    target: &FieldTarget,
) -> Result<sql::ast::Expression, Error> {
    match target {
        FieldTarget::Column { column, .. } => Ok(column.clone()),
        FieldTarget::Nested { .. } => Ok(env
            .dialect
            .index_expression(target.scalar(env, ValueKind::Text))),
        FieldTarget::Array { array, remainder }
            if remainder.is_empty() && array.path.is_empty() =>
        {
            Ok(array.document.clone())
        }
        FieldTarget::Array { .. } => {
            Err(env.unsupported(&format!("index on elements of the array in '{field}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::dialect;
    use crate::translation::helpers::TranslationOptions;
    use query_engine_metadata::metadata::{CollectionSchema, FieldDefinition, LogicalType};
    use query_engine_sql::sql::dialect::Dialect;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn users() -> CollectionSchema {
        let mut schema = CollectionSchema::new("users");
        for (path, logical_type) in [
            ("_id", LogicalType::String),
            ("email", LogicalType::String),
            ("age", LogicalType::Integer),
            ("address", LogicalType::Object),
            ("address.city", LogicalType::String),
            ("skills", LogicalType::Array),
        ] {
            schema.insert(FieldDefinition::new(path, logical_type, "TEXT".to_string()));
        }
        schema
    }

    fn render(
        dialect: Dialect,
        fields: Value,
        options: IndexOptions,
    ) -> Result<String, Error> {
        let schema = users();
        let translation_options = TranslationOptions::default();
        let env = Env::new(
            dialect::for_dialect(dialect),
            Some(&schema),
            &translation_options,
        );
        let fields = fields.as_object().cloned().unwrap_or_default();
        let index = translate_create_index(&env, "users", "users_idx", &fields, &options)?;
        Ok(sql::ast::Statement::CreateIndex(index).render(dialect).sql)
    }

    #[test]
    fn unique_compound_index() {
        assert_eq!(
            render(
                Dialect::Sqlite,
                json!({"email": 1, "age": -1}),
                IndexOptions {
                    unique: true,
                    sparse: false
                }
            )
            .unwrap(),
            r#"CREATE UNIQUE INDEX IF NOT EXISTS "users_idx" ON "users" ("email" ASC, "age" DESC)"#
        );
    }

    #[test]
    fn nested_paths_are_inlined() {
        assert_eq!(
            render(Dialect::Sqlite, json!({"address.city": 1}), IndexOptions::default()).unwrap(),
            r#"CREATE INDEX IF NOT EXISTS "users_idx" ON "users" ((json_extract("address", '$.city')) ASC)"#
        );
        assert_eq!(
            render(Dialect::Mysql, json!({"address.city": 1}), IndexOptions::default()).unwrap(),
            "CREATE INDEX `users_idx` ON `users` ((CAST(JSON_UNQUOTE(JSON_EXTRACT(`address`, '$.city')) AS CHAR(255))) ASC)"
        );
    }

    #[test]
    fn sparse_indexes_are_partial_where_supported() {
        let sparse = IndexOptions {
            unique: false,
            sparse: true,
        };
        assert_eq!(
            render(Dialect::Postgres, json!({"email": 1}), sparse.clone()).unwrap(),
            r#"CREATE INDEX IF NOT EXISTS "users_idx" ON "users" ("email" ASC) WHERE "email" IS NOT NULL"#
        );
        assert_eq!(
            render(Dialect::Mysql, json!({"email": 1}), sparse).unwrap(),
            "CREATE INDEX `users_idx` ON `users` (`email` ASC)"
        );
    }

    #[test]
    fn malformed_and_unsupported_indexes() {
        assert!(matches!(
            render(Dialect::Sqlite, json!({}), IndexOptions::default()),
            Err(Error::MalformedIndex(_))
        ));
        assert!(matches!(
            render(Dialect::Sqlite, json!({"email": "text"}), IndexOptions::default()),
            Err(Error::MalformedIndex(_))
        ));
        assert!(matches!(
            render(Dialect::Sqlite, json!({"skills.name": 1}), IndexOptions::default()),
            Err(Error::UnsupportedOperator { .. })
        ));
    }
}
