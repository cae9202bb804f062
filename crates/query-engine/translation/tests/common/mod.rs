use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use query_engine_metadata::metadata::{Document, InMemorySchemaRegistry};
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::Dialect;
use query_engine_translation::translation::helpers::TranslationOptions;
use query_engine_translation::translation::mutation::MutationScope;
use query_engine_translation::translation::query::FindOptions;
use query_engine_translation::translation::schema::index::IndexOptions;
use query_engine_translation::translation::Translator;
use serde::Deserialize;

/// A translation request read from `tests/goldenfiles/<name>/request.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    dialect: Dialect,
    collection: String,
    /// Registered before the operation is translated.
    #[serde(default)]
    schema: Option<serde_json::Value>,
    #[serde(default)]
    options: Option<TranslationOptions>,
    operation: Operation,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Operation {
    Find {
        filter: Document,
        #[serde(default)]
        options: FindOptions,
    },
    Count {
        filter: Document,
    },
    Insert {
        documents: Vec<Document>,
    },
    Update {
        update: Document,
        filter: Document,
        scope: MutationScope,
    },
    Delete {
        filter: Document,
        scope: MutationScope,
    },
    CreateCollection,
    CreateIndex {
        name: String,
        fields: Document,
        #[serde(default)]
        options: IndexOptions,
    },
}

/// Translate the request of a goldenfile directory and render the SQL with its parameters.
pub fn test_translation(testname: &str) -> anyhow::Result<String> {
    let directory = PathBuf::from("tests/goldenfiles").join(testname);
    let request: Request =
        serde_json::from_str(&fs::read_to_string(directory.join("request.json"))?)?;

    let translator = Translator::new(
        request.dialect,
        Arc::new(InMemorySchemaRegistry::new()),
        request.options.unwrap_or_default(),
    );
    let table = request.collection.as_str();
    let create_table = request
        .schema
        .as_ref()
        .map(|schema| translator.translate_schema(table, Some(schema)))
        .transpose()?;

    let query = match request.operation {
        Operation::Find { filter, options } => translator.translate_find(table, &filter, &options)?,
        Operation::Count { filter } => translator.translate_count(table, &filter)?,
        Operation::Insert { documents } => translator.translate_insert_many(table, &documents)?,
        Operation::Update {
            update,
            filter,
            scope,
        } => translator.translate_update(table, &update, &filter, scope)?,
        Operation::Delete { filter, scope } => translator.translate_delete(table, &filter, scope)?,
        // without a schema the collection stores whole documents
        Operation::CreateCollection => match create_table {
            Some(create_table) => create_table,
            None => translator.translate_schema(table, None)?,
        },
        Operation::CreateIndex {
            name,
            fields,
            options,
        } => translator.translate_create_index(table, &name, &fields, &options)?,
    };

    let params: Vec<(usize, &sql::string::Param)> = query
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, p))
        .collect();

    Ok(format!("{}\n\n{:?}", query.sql, params))
}
