//! Collections and documents shared by test cases.

use query_engine_metadata::metadata::Document;
use serde_json::{json, Value};

/// Turn a JSON object literal into a document.
///
/// Panics when the value is not an object.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(document) => document,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// The schema of the `users` collection.
pub fn users_schema() -> Value {
    json!({
        "$jsonSchema": {
            "bsonType": "object",
            "required": ["name"],
            "properties": {
                "_id": {"bsonType": "string"},
                "name": {"bsonType": "string"},
                "age": {"bsonType": "int"},
                "active": {"bsonType": "bool"},
                "tags": {"bsonType": "array", "items": {"bsonType": "string"}},
                "address": {
                    "bsonType": "object",
                    "properties": {
                        "city": {"bsonType": "string"},
                        "zip": {"bsonType": "string"}
                    }
                }
            }
        }
    })
}

/// Five users with a spread of ages, tags and cities.
pub fn users() -> Vec<Document> {
    vec![
        doc(json!({"_id": "u1", "name": "Ann", "age": 31, "active": true, "tags": ["admin", "dev"], "address": {"city": "Oslo", "zip": "0150"}})),
        doc(json!({"_id": "u2", "name": "Bob", "age": 17, "active": false, "tags": ["dev"], "address": {"city": "Bergen"}})),
        doc(json!({"_id": "u3", "name": "Cid", "age": 45, "active": true, "tags": [], "address": {"city": "Oslo"}})),
        doc(json!({"_id": "u4", "name": "Dee", "age": 25, "active": true, "tags": ["ops"]})),
        doc(json!({"_id": "u5", "name": "Eve", "active": false})),
    ]
}
