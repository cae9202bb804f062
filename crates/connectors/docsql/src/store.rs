//! A document store on top of a relational database.
//!
//! Every operation is translated to one parameterized statement, run through the executor and,
//! for reads, materialized back into documents.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info_span, Instrument};

use docsql_configuration::Configuration;
use query_engine_execution::error::Error;
use query_engine_execution::executor::{Executor, QueryResult};
use query_engine_execution::metrics::Metrics;
use query_engine_execution::{materialize, query};
use query_engine_metadata::metadata::{Document, InMemorySchemaRegistry, ID_FIELD};
use query_engine_sql::sql::string::SQL;
use query_engine_translation::translation::error::Error as TranslationError;
use query_engine_translation::translation::mutation::MutationScope;
use query_engine_translation::translation::query::FindOptions;
use query_engine_translation::translation::schema::index::IndexOptions;
use query_engine_translation::translation::Translator;

use crate::state::{self, InitializationError};

/// Collections of documents stored in the tables of one database.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    translator: Translator,
    executor: Arc<dyn Executor>,
    metrics: Metrics,
}

impl DocumentStore {
    pub fn new(translator: Translator, executor: Arc<dyn Executor>, metrics: Metrics) -> Self {
        DocumentStore {
            translator,
            executor,
            metrics,
        }
    }

    /// Connect to the configured database and create the collections the configuration
    /// declares.
    pub async fn open(
        configuration: &Configuration,
        metrics_registry: &mut prometheus::Registry,
    ) -> Result<Self, InitializationError> {
        let state = state::create_state(configuration, metrics_registry).await?;
        let translator = Translator::new(
            configuration.dialect,
            Arc::new(InMemorySchemaRegistry::new()),
            configuration.translation_options.clone(),
        );
        let store = DocumentStore::new(translator, state.executor, state.metrics);

        for (name, json_schema) in &configuration.collections {
            store
                .collection(name)
                .create(Some(json_schema))
                .await
                .map_err(|source| InitializationError::CollectionSetup {
                    collection: name.clone(),
                    source,
                })?;
        }
        tracing::info!(
            dialect = %configuration.dialect,
            collections = configuration.collections.len(),
            "document store opened"
        );
        Ok(store)
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn collection(&self, name: &str) -> Collection<'_> {
        Collection {
            store: self,
            name: name.to_string(),
        }
    }

    fn translated(&self, translation: Result<SQL, TranslationError>) -> Result<SQL, Error> {
        translation.map_err(|err| {
            self.metrics.translation_failures_total.inc();
            tracing::warn!(error = %err, "translation failed");
            Error::Translation(err)
        })
    }

    async fn run(&self, statement: &SQL) -> Result<QueryResult, Error> {
        query::execute(self.executor.as_ref(), &self.metrics, statement).await
    }
}

/// A handle on one collection of a store.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    store: &'a DocumentStore,
    name: String,
}

impl Collection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the collection's table. Without a JSON Schema each document is kept whole in one
    /// JSON column.
    pub async fn create(&self, json_schema: Option<&Value>) -> Result<(), Error> {
        let statement = self
            .store
            .translated(self.store.translator.translate_schema(&self.name, json_schema))?;
        self.store
            .run(&statement)
            .instrument(info_span!("Create collection", collection = %self.name))
            .await?;
        Ok(())
    }

    /// Drop the collection's table, if there is one.
    pub async fn drop(&self) -> Result<(), Error> {
        let statement = self.store.translator.translate_drop_collection(&self.name);
        self.store.run(&statement).await?;
        Ok(())
    }

    /// Insert a document, giving it a fresh `_id` if it has none. Returns the `_id`.
    pub async fn insert_one(&self, document: Document) -> Result<Value, Error> {
        let (id, document) = with_id(document);
        let statement = self
            .store
            .translated(self.store.translator.translate_insert(&self.name, &document))?;
        self.store.run(&statement).await?;
        Ok(id)
    }

    /// Insert documents in one statement. Returns their `_id`s in order.
    pub async fn insert_many(&self, documents: Vec<Document>) -> Result<Vec<Value>, Error> {
        if documents.is_empty() {
            return Ok(vec![]);
        }
        let (ids, documents): (Vec<Value>, Vec<Document>) =
            documents.into_iter().map(with_id).unzip();
        let statement = self.store.translated(
            self.store
                .translator
                .translate_insert_many(&self.name, &documents),
        )?;
        self.store.run(&statement).await?;
        Ok(ids)
    }

    pub async fn find(&self, filter: &Document, options: &FindOptions) -> Result<Vec<Document>, Error> {
        let statement = self.store.translated(
            self.store
                .translator
                .translate_find(&self.name, filter, options),
        )?;
        let result = self
            .store
            .run(&statement)
            .instrument(info_span!("Find documents", collection = %self.name))
            .await?;

        let schema = self.store.translator.schema(&self.name);
        let documents = materialize::materialize_rows(
            result.rows,
            schema.as_deref(),
            &self.store.translator.options().array_field_hints,
        );
        match &options.projection {
            Some(projection) => documents
                .into_iter()
                .map(|document| materialize::apply_projection(document, projection))
                .collect(),
            None => Ok(documents),
        }
    }

    pub async fn find_one(&self, filter: &Document) -> Result<Option<Document>, Error> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find(filter, &options).await?.into_iter().next())
    }

    pub async fn count_documents(&self, filter: &Document) -> Result<u64, Error> {
        let statement = self
            .store
            .translated(self.store.translator.translate_count(&self.name, filter))?;
        let result = self.store.run(&statement).await?;
        Ok(result
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Apply an update to the first matching document. Returns how many documents changed.
    pub async fn update_one(&self, filter: &Document, update: &Document) -> Result<u64, Error> {
        self.update(filter, update, MutationScope::One).await
    }

    /// Apply an update to every matching document. Returns how many documents changed.
    pub async fn update_many(&self, filter: &Document, update: &Document) -> Result<u64, Error> {
        self.update(filter, update, MutationScope::Many).await
    }

    pub async fn delete_one(&self, filter: &Document) -> Result<u64, Error> {
        self.delete(filter, MutationScope::One).await
    }

    pub async fn delete_many(&self, filter: &Document) -> Result<u64, Error> {
        self.delete(filter, MutationScope::Many).await
    }

    pub async fn create_index(
        &self,
        index_name: &str,
        fields: &Document,
        options: &IndexOptions,
    ) -> Result<(), Error> {
        let statement = self.store.translated(
            self.store
                .translator
                .translate_create_index(&self.name, index_name, fields, options),
        )?;
        self.store.run(&statement).await?;
        Ok(())
    }

    async fn update(
        &self,
        filter: &Document,
        update: &Document,
        scope: MutationScope,
    ) -> Result<u64, Error> {
        let statement = self.store.translated(
            self.store
                .translator
                .translate_update(&self.name, update, filter, scope),
        )?;
        let result = self
            .store
            .run(&statement)
            .instrument(info_span!("Update documents", collection = %self.name))
            .await?;
        Ok(result.row_count)
    }

    async fn delete(&self, filter: &Document, scope: MutationScope) -> Result<u64, Error> {
        let statement = self.store.translated(
            self.store
                .translator
                .translate_delete(&self.name, filter, scope),
        )?;
        Ok(self.store.run(&statement).await?.row_count)
    }
}

/// The document's `_id`, assigning a UUID first when it has none or it is `null`.
fn with_id(mut document: Document) -> (Value, Document) {
    match document.get(ID_FIELD) {
        Some(Value::Null) => {
            document.remove(ID_FIELD);
        }
        Some(id) => return (id.clone(), document),
        None => {}
    }
    let id = Value::String(uuid::Uuid::new_v4().to_string());
    let mut identified = Document::new();
    identified.insert(ID_FIELD.to_string(), id.clone());
    identified.extend(document);
    (id, identified)
}
