//! The translation surface: every document operation rendered to parameterized SQL for one
//! dialect, consulting and maintaining the schema registry.

use std::sync::Arc;

use query_engine_metadata::metadata::{CollectionSchema, Document, SchemaRegistry};
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::string::SQL;
use serde_json::Value;

use super::dialect::{self, DialectOps};
use super::error::Error;
use super::helpers::{Env, State, TranslationOptions};
use super::mutation::{self, MutationScope};
use super::query::{self, FindOptions};
use super::schema::{self, index::IndexOptions};

/// Translates document operations on collections to SQL.
#[derive(Debug, Clone)]
pub struct Translator {
    dialect: &'static dyn DialectOps,
    registry: Arc<dyn SchemaRegistry>,
    options: TranslationOptions,
}

impl Translator {
    pub fn new(
        dialect: Dialect,
        registry: Arc<dyn SchemaRegistry>,
        options: TranslationOptions,
    ) -> Self {
        Translator {
            dialect: dialect::for_dialect(dialect),
            registry,
            options,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect.dialect()
    }

    pub fn registry(&self) -> &Arc<dyn SchemaRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// The registered schema of a collection, if it was created with one.
    pub fn schema(&self, table: &str) -> Option<Arc<CollectionSchema>> {
        self.registry.lookup(table)
    }

    /// The body of a WHERE clause, or an empty string when the filter matches everything.
    /// Columns are qualified with `table_alias` when given.
    pub fn translate_filter(
        &self,
        table: &str,
        filter: &Document,
        table_alias: Option<&str>,
    ) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let mut env = Env::new(self.dialect, schema.as_deref(), &self.options);
        env.table = table_alias.map(|alias| {
            sql::ast::TableReference::DBTable(sql::ast::TableName(alias.to_string()))
        });
        let condition = query::filtering::translate_filter(&env, &mut State::new(), filter)?;

        let mut sql = SQL::new(self.dialect());
        if condition != sql::helpers::true_expr() {
            condition.to_sql(&mut sql);
        }
        log_translation("filter", table, &sql);
        Ok(sql)
    }

    pub fn translate_update(
        &self,
        table: &str,
        update: &Document,
        filter: &Document,
        scope: MutationScope,
    ) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let env = Env::new(self.dialect, schema.as_deref(), &self.options);
        let update = mutation::update::translate_update(&env, table, update, filter, scope)?;
        Ok(self.render("update", table, sql::ast::Statement::Update(update)))
    }

    pub fn translate_insert(&self, table: &str, document: &Document) -> Result<SQL, Error> {
        self.translate_insert_many(table, std::slice::from_ref(document))
    }

    /// One multi-row `INSERT` for all documents.
    pub fn translate_insert_many(&self, table: &str, documents: &[Document]) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let env = Env::new(self.dialect, schema.as_deref(), &self.options);
        let insert = mutation::insert::translate_insert(&env, table, documents)?;
        Ok(self.render("insert", table, sql::ast::Statement::Insert(insert)))
    }

    pub fn translate_delete(
        &self,
        table: &str,
        filter: &Document,
        scope: MutationScope,
    ) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let env = Env::new(self.dialect, schema.as_deref(), &self.options);
        let delete = mutation::delete::translate_delete(&env, table, filter, scope)?;
        Ok(self.render("delete", table, sql::ast::Statement::Delete(delete)))
    }

    pub fn translate_find(
        &self,
        table: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let env = Env::new(self.dialect, schema.as_deref(), &self.options);
        let select = query::translate_find(&env, table, filter, options)?;
        Ok(self.render("find", table, sql::ast::Statement::Select(select)))
    }

    pub fn translate_count(&self, table: &str, filter: &Document) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let env = Env::new(self.dialect, schema.as_deref(), &self.options);
        let select = query::translate_count(&env, table, filter)?;
        Ok(self.render("count", table, sql::ast::Statement::Select(select)))
    }

    /// The `CREATE TABLE` for a collection. The derived layout is registered, replacing any
    /// earlier one.
    pub fn translate_schema(&self, table: &str, json_schema: Option<&Value>) -> Result<SQL, Error> {
        let env = Env::new(self.dialect, None, &self.options);
        let (create_table, collection_schema) =
            schema::translate_schema(&env, table, json_schema)?;
        self.registry.register(collection_schema);
        Ok(self.render(
            "schema",
            table,
            sql::ast::Statement::CreateTable(create_table),
        ))
    }

    pub fn translate_drop_collection(&self, table: &str) -> SQL {
        self.registry.unregister(table);
        self.render(
            "drop",
            table,
            sql::ast::Statement::DropTable(schema::translate_drop(table)),
        )
    }

    pub fn translate_create_index(
        &self,
        table: &str,
        index_name: &str,
        fields: &Document,
        options: &IndexOptions,
    ) -> Result<SQL, Error> {
        let schema = self.registry.lookup(table);
        let env = Env::new(self.dialect, schema.as_deref(), &self.options);
        let create_index =
            schema::index::translate_create_index(&env, table, index_name, fields, options)?;
        Ok(self.render(
            "index",
            table,
            sql::ast::Statement::CreateIndex(create_index),
        ))
    }

    fn render(&self, operation: &str, table: &str, statement: sql::ast::Statement) -> SQL {
        let sql = statement.render(self.dialect());
        log_translation(operation, table, &sql);
        sql
    }
}

fn log_translation(operation: &str, table: &str, sql: &SQL) {
    tracing::debug!(
        operation,
        table,
        generated_sql = %sql.sql,
        params = ?&sql.params,
        "translated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_metadata::metadata::InMemorySchemaRegistry;
    use query_engine_sql::sql::string::Param;
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn document(value: Value) -> Document {
        value.as_object().cloned().unwrap_or_default()
    }

    fn translator(dialect: Dialect) -> Translator {
        Translator::new(
            dialect,
            Arc::new(InMemorySchemaRegistry::new()),
            TranslationOptions::default(),
        )
    }

    #[test]
    fn filters_render_without_where() {
        let translator = translator(Dialect::Postgres);
        let sql = translator
            .translate_filter("users", &document(json!({"name": "Ann"})), Some("u"))
            .unwrap();
        assert_eq!(sql.sql, r#""u"."name" = $1"#);
        assert_eq!(sql.params, vec![Param::String("Ann".to_string())]);

        let everything = translator
            .translate_filter("users", &Document::new(), None)
            .unwrap();
        assert!(everything.is_empty());
        assert!(everything.params.is_empty());
    }

    #[test]
    fn creating_a_collection_registers_its_layout() {
        let translator = translator(Dialect::Sqlite);
        translator
            .translate_schema(
                "users",
                Some(&json!({"properties": {"tags": {"type": "array"}, "age": {"type": "integer"}}})),
            )
            .unwrap();
        assert!(translator
            .schema("users")
            .is_some_and(|schema| schema.column("tags").is_some()));

        let sql = translator
            .translate_filter("users", &document(json!({"tags": "a"})), None)
            .unwrap();
        assert_eq!(
            sql.sql,
            r#"EXISTS (SELECT 1 FROM json_each("tags") AS "elem_0" WHERE "elem_0"."value" = ?)"#
        );

        let drop = translator.translate_drop_collection("users");
        assert_eq!(drop.sql, r#"DROP TABLE IF EXISTS "users""#);
        assert!(translator.schema("users").is_none());
    }

    #[test]
    fn insert_one_is_a_single_row_insert() {
        let translator = translator(Dialect::Mysql);
        let sql = translator
            .translate_insert("users", &document(json!({"_id": "u1", "age": 3})))
            .unwrap();
        assert_eq!(sql.sql, "INSERT INTO `users` (`_id`, `age`) VALUES (?, ?)");
        assert_eq!(
            sql.params,
            vec![Param::String("u1".to_string()), Param::Integer(3)]
        );
    }

    #[test]
    fn values_never_reach_the_sql_text() {
        let translator = translator(Dialect::Sqlite);
        let hostile = "'; DROP TABLE users; --";
        let sql = translator
            .translate_update(
                "users",
                &document(json!({"$set": {"name": hostile}})),
                &document(json!({"name": {"$in": [hostile]}})),
                MutationScope::Many,
            )
            .unwrap();
        assert!(!sql.sql.contains("DROP"));
        assert!(sql.params.contains(&Param::String(hostile.to_string())));
    }
}
