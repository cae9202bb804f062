//! Documents round-tripped through an in-memory SQLite database.

use query_engine_execution::error::Error;
use query_engine_translation::translation::helpers::TranslationOptions;
use query_engine_translation::translation::query::FindOptions;
use query_engine_translation::translation::schema::index::IndexOptions;
use serde_json::json;
use tests_common::fixtures::{self, doc};
use tests_common::store::{sqlite_store, users_store};

fn ids(documents: &[query_engine_metadata::metadata::Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|document| document.get("_id").and_then(|id| id.as_str()))
        .map(str::to_string)
        .collect()
}

async fn find_ids(store: &docsql::DocumentStore, filter: serde_json::Value) -> Vec<String> {
    let options = FindOptions {
        sort: Some(doc(json!({"_id": 1}))),
        ..FindOptions::default()
    };
    let documents = store
        .collection("users")
        .find(&doc(filter), &options)
        .await
        .unwrap();
    ids(&documents)
}

mod round_trip {
    use super::*;

    #[tokio::test]
    async fn documents_come_back_unchanged() {
        let store = users_store().await;
        let users = store.collection("users");
        for expected in fixtures::users() {
            let found = users
                .find_one(&doc(json!({"_id": expected["_id"]})))
                .await
                .unwrap();
            assert_eq!(found, Some(expected));
        }
    }

    #[tokio::test]
    async fn generated_ids_find_their_document() {
        let store = users_store().await;
        let users = store.collection("users");
        let id = users
            .insert_one(doc(json!({"name": "Fay", "age": 52})))
            .await
            .unwrap();

        let found = users.find_one(&doc(json!({"_id": id}))).await.unwrap();
        assert_eq!(found, Some(doc(json!({"_id": id, "name": "Fay", "age": 52}))));
    }

    #[tokio::test]
    async fn null_ids_are_generated_too() {
        let store = users_store().await;
        let users = store.collection("users");
        let id = users
            .insert_one(doc(json!({"_id": null, "name": "Gil"})))
            .await
            .unwrap();
        assert!(id.is_string());

        let found = users.find_one(&doc(json!({"_id": id}))).await.unwrap();
        assert_eq!(found, Some(doc(json!({"_id": id, "name": "Gil"}))));
    }

    #[tokio::test]
    async fn untyped_and_double_fields_keep_their_types() {
        let store = sqlite_store(TranslationOptions::default()).await;
        let readings = store.collection("readings");
        readings
            .create(Some(&json!({
                "$jsonSchema": {
                    "bsonType": "object",
                    "properties": {
                        "_id": {"bsonType": "string"},
                        "score": {"bsonType": "double"},
                        "extra": {}
                    }
                }
            })))
            .await
            .unwrap();
        let documents = vec![
            doc(json!({"_id": "r1", "score": 25, "extra": true})),
            doc(json!({"_id": "r2", "score": 2.5, "extra": 5})),
            doc(json!({"_id": "r3", "extra": "5"})),
            doc(json!({"_id": "r4", "extra": {"a": 1}})),
        ];
        readings.insert_many(documents.clone()).await.unwrap();

        for expected in documents {
            let found = readings
                .find_one(&doc(json!({"_id": expected["_id"]})))
                .await
                .unwrap();
            assert_eq!(found, Some(expected));
        }
        for (filter, expected) in [
            (json!({"extra": 5}), vec!["r2"]),
            (json!({"extra": "5"}), vec!["r3"]),
            (json!({"extra": true}), vec!["r1"]),
        ] {
            let found = readings
                .find(&doc(filter), &FindOptions::default())
                .await
                .unwrap();
            assert_eq!(ids(&found), expected);
        }
    }

    #[tokio::test]
    async fn document_mode_collections_keep_whole_documents() {
        let store = sqlite_store(TranslationOptions::default()).await;
        let events = store.collection("events");
        events.create(None).await.unwrap();
        let id = events
            .insert_one(doc(json!({"kind": "click", "at": {"x": 3, "y": [1, 2]}})))
            .await
            .unwrap();
        events
            .insert_one(doc(json!({"kind": "view"})))
            .await
            .unwrap();

        let found = events
            .find(&doc(json!({"kind": "click"})), &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(
            found,
            vec![doc(json!({"_id": id, "kind": "click", "at": {"x": 3, "y": [1, 2]}}))]
        );
    }

    #[tokio::test]
    async fn undeclared_fields_overflow_into_extra() {
        let store = sqlite_store(TranslationOptions {
            extra_fields: true,
            ..TranslationOptions::default()
        })
        .await;
        let users = store.collection("users");
        users.create(Some(&fixtures::users_schema())).await.unwrap();
        users
            .insert_one(doc(json!({"_id": "x1", "name": "Gus", "nickname": "G", "prefs": {"dark": true}})))
            .await
            .unwrap();

        let found = users
            .find_one(&doc(json!({"nickname": "G"})))
            .await
            .unwrap();
        assert_eq!(
            found,
            Some(doc(json!({"_id": "x1", "name": "Gus", "nickname": "G", "prefs": {"dark": true}})))
        );
    }
}

mod filters {
    use super::*;

    #[tokio::test]
    async fn empty_filter_matches_everything() {
        let store = users_store().await;
        assert_eq!(
            find_ids(&store, json!({})).await,
            vec!["u1", "u2", "u3", "u4", "u5"]
        );
    }

    #[tokio::test]
    async fn ranges_and_alternatives() {
        let store = users_store().await;
        assert_eq!(
            find_ids(&store, json!({"age": {"$gte": 25, "$lte": 35}})).await,
            vec!["u1", "u4"]
        );
        assert_eq!(
            find_ids(&store, json!({"$or": [{"age": {"$lt": 20}}, {"age": {"$gt": 60}}]})).await,
            vec!["u2"]
        );
    }

    #[tokio::test]
    async fn in_matches_array_elements() {
        let store = users_store().await;
        assert_eq!(
            find_ids(&store, json!({"tags": {"$in": ["dev"]}})).await,
            vec!["u1", "u2"]
        );
        assert_eq!(find_ids(&store, json!({"tags": "ops"})).await, vec!["u4"]);
    }

    #[tokio::test]
    async fn empty_in_and_nin() {
        let store = users_store().await;
        assert!(find_ids(&store, json!({"tags": {"$in": []}})).await.is_empty());
        assert_eq!(
            find_ids(&store, json!({"tags": {"$nin": []}})).await,
            vec!["u1", "u2", "u3", "u4", "u5"]
        );
    }

    #[tokio::test]
    async fn nested_fields_booleans_and_patterns() {
        let store = users_store().await;
        assert_eq!(
            find_ids(&store, json!({"address.city": "Oslo"})).await,
            vec!["u1", "u3"]
        );
        assert_eq!(
            find_ids(&store, json!({"active": true})).await,
            vec!["u1", "u3", "u4"]
        );
        assert_eq!(
            find_ids(&store, json!({"name": {"$regex": "^A"}})).await,
            vec!["u1"]
        );
        assert!(find_ids(&store, json!({"name": {"$regex": "^a"}}))
            .await
            .is_empty());
        assert_eq!(
            find_ids(&store, json!({"name": {"$regex": "^a", "$options": "i"}})).await,
            vec!["u1"]
        );
        assert_eq!(
            find_ids(&store, json!({"age": {"$exists": false}})).await,
            vec!["u5"]
        );
    }

    #[tokio::test]
    async fn sort_skip_limit_and_projection() {
        let store = users_store().await;
        let options = FindOptions {
            sort: Some(doc(json!({"age": 1}))),
            skip: Some(1),
            limit: Some(2),
            projection: Some(doc(json!({"name": 1}))),
        };
        let found = store
            .collection("users")
            .find(&doc(json!({})), &options)
            .await
            .unwrap();
        // SQLite sorts missing values first
        assert_eq!(
            found,
            vec![
                doc(json!({"_id": "u2", "name": "Bob"})),
                doc(json!({"_id": "u4", "name": "Dee"})),
            ]
        );
    }

    #[tokio::test]
    async fn counts() {
        let store = users_store().await;
        let users = store.collection("users");
        assert_eq!(users.count_documents(&doc(json!({}))).await.unwrap(), 5);
        assert_eq!(
            users
                .count_documents(&doc(json!({"active": false})))
                .await
                .unwrap(),
            2
        );
    }
}

mod updates {
    use super::*;

    async fn user(store: &docsql::DocumentStore, id: &str) -> serde_json::Value {
        serde_json::Value::Object(
            store
                .collection("users")
                .find_one(&doc(json!({"_id": id})))
                .await
                .unwrap()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn nested_set_creates_the_document() {
        let store = users_store().await;
        let changed = store
            .collection("users")
            .update_one(
                &doc(json!({"_id": "u4"})),
                &doc(json!({"$set": {"address.city": "Tromsø"}})),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(user(&store, "u4").await["address"], json!({"city": "Tromsø"}));
    }

    #[tokio::test]
    async fn set_inc_and_unset() {
        let store = users_store().await;
        store
            .collection("users")
            .update_one(
                &doc(json!({"_id": "u2"})),
                &doc(json!({"$set": {"name": "Bo"}, "$inc": {"age": 1}, "$unset": {"active": ""}})),
            )
            .await
            .unwrap();
        assert_eq!(
            user(&store, "u2").await,
            json!({"_id": "u2", "name": "Bo", "age": 18, "tags": ["dev"], "address": {"city": "Bergen"}})
        );
    }

    #[tokio::test]
    async fn add_to_set_is_idempotent() {
        let store = users_store().await;
        let users = store.collection("users");
        for _ in 0..2 {
            users
                .update_one(
                    &doc(json!({"_id": "u2"})),
                    &doc(json!({"$addToSet": {"tags": "ops"}})),
                )
                .await
                .unwrap();
        }
        assert_eq!(user(&store, "u2").await["tags"], json!(["dev", "ops"]));
    }

    #[tokio::test]
    async fn push_and_pull() {
        let store = users_store().await;
        let users = store.collection("users");
        users
            .update_one(
                &doc(json!({"_id": "u5"})),
                &doc(json!({"$push": {"tags": "new"}})),
            )
            .await
            .unwrap();
        assert_eq!(user(&store, "u5").await["tags"], json!(["new"]));

        users
            .update_many(&doc(json!({})), &doc(json!({"$pull": {"tags": "dev"}})))
            .await
            .unwrap();
        assert_eq!(user(&store, "u1").await["tags"], json!(["admin"]));
        assert_eq!(user(&store, "u2").await["tags"], json!([]));
    }

    #[tokio::test]
    async fn update_one_touches_a_single_document() {
        let store = users_store().await;
        let users = store.collection("users");
        let changed = users
            .update_one(
                &doc(json!({"active": true})),
                &doc(json!({"$set": {"active": false}})),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(
            users
                .count_documents(&doc(json!({"active": false})))
                .await
                .unwrap(),
            3
        );

        let changed = users
            .update_many(
                &doc(json!({"active": false})),
                &doc(json!({"$set": {"active": true}})),
            )
            .await
            .unwrap();
        assert_eq!(changed, 3);
    }
}

mod deletes {
    use super::*;

    #[tokio::test]
    async fn delete_one_and_many() {
        let store = users_store().await;
        let users = store.collection("users");
        assert_eq!(
            users
                .delete_one(&doc(json!({"active": false})))
                .await
                .unwrap(),
            1
        );
        assert_eq!(users.count_documents(&doc(json!({}))).await.unwrap(), 4);
        assert_eq!(
            users
                .delete_many(&doc(json!({"age": {"$gte": 25}})))
                .await
                .unwrap(),
            3
        );
        assert_eq!(users.count_documents(&doc(json!({}))).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dropped_collections_are_gone() {
        let store = users_store().await;
        let users = store.collection("users");
        users.drop().await.unwrap();
        assert!(store.translator().schema("users").is_none());
        assert!(matches!(
            users.count_documents(&doc(json!({}))).await,
            Err(Error::Execution(_))
        ));
    }
}

mod safety {
    use super::*;

    #[tokio::test]
    async fn hostile_values_stay_parameters() {
        let store = users_store().await;
        let users = store.collection("users");
        let hostile = "Robert'); DROP TABLE \"users\"; --";
        users
            .insert_one(doc(json!({"_id": "u6", "name": hostile})))
            .await
            .unwrap();

        let statement = store
            .translator()
            .translate_filter("users", &doc(json!({"name": hostile})), None)
            .unwrap();
        assert!(!statement.sql.contains(hostile));

        assert_eq!(find_ids(&store, json!({"name": hostile})).await, vec!["u6"]);
        assert_eq!(users.count_documents(&doc(json!({}))).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn unique_indexes_reject_duplicates() {
        let store = users_store().await;
        let users = store.collection("users");
        users
            .create_index(
                "users_name",
                &doc(json!({"name": 1})),
                &IndexOptions {
                    unique: true,
                    sparse: false,
                },
            )
            .await
            .unwrap();

        let duplicate = users.insert_one(doc(json!({"name": "Ann"}))).await;
        assert!(matches!(duplicate, Err(Error::Execution(_))));
        assert_eq!(store.metrics().statement_failures_total.get(), 1);
    }

    #[tokio::test]
    async fn translation_failures_never_reach_the_database() {
        let store = users_store().await;
        let before = store.metrics().statements_total.get();
        let result = store
            .collection("users")
            .find(&doc(json!({"$where": "1 = 1"})), &FindOptions::default())
            .await;
        assert!(matches!(result, Err(Error::Translation(_))));
        assert_eq!(store.metrics().translation_failures_total.get(), 1);
        assert_eq!(store.metrics().statements_total.get(), before);
    }
}
