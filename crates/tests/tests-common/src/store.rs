//! Stores backed by private in-memory SQLite databases.

use docsql::DocumentStore;
use docsql_configuration::{values::Secret, Configuration, ConnectionUri, ParsedConfiguration};
use docsql_configuration::environment::FixedEnvironment;
use query_engine_translation::translation::helpers::TranslationOptions;

use crate::fixtures;

/// An empty store.
pub async fn sqlite_store(options: TranslationOptions) -> DocumentStore {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut parsed = ParsedConfiguration::initial();
    parsed.connection_uri = ConnectionUri(Secret::from("sqlite::memory:"));
    parsed.extra_fields = options.extra_fields;
    parsed.array_field_hints = options.array_field_hints;
    let configuration: Configuration =
        docsql_configuration::make_runtime_configuration(parsed, FixedEnvironment::default())
            .expect("an in-memory configuration needs no environment");

    DocumentStore::open(&configuration, &mut prometheus::Registry::new())
        .await
        .expect("unable to open an in-memory store")
}

/// A store with the `users` collection created and filled.
pub async fn users_store() -> DocumentStore {
    let store = sqlite_store(TranslationOptions::default()).await;
    let users = store.collection("users");
    users
        .create(Some(&fixtures::users_schema()))
        .await
        .expect("unable to create users");
    users
        .insert_many(fixtures::users())
        .await
        .expect("unable to insert users");
    store
}
