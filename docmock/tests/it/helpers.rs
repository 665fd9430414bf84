use bson::{DateTime, Document, doc};
use chrono::{TimeZone, Utc};

use docmock::{
    memory::{InMemoryStore, InMemoryStoreBuilder},
    prelude::*,
};

/// Midnight UTC on 2017-01-01, the `createdOn` of the fixture users.
pub fn created_on() -> DateTime {
    DateTime::from_chrono(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
}

/// Three users aged 15, 10 and 20. `user_a` has a `friends` sub-collection
/// whose `user_b` entry references `users/user_b`.
pub fn users_fixture() -> Document {
    doc! {
        "__collection__": {
            "users": {
                "__doc__": {
                    "user_a": {
                        "age": 15,
                        "username": "user_a",
                        "address": { "home": "San Francisco", "work": "Silicon Valley" },
                        "createdOn": created_on(),
                        "pinnedBooks": ["book_1", "book_2"],
                        "pinnedFoods": ["food_1", "food_2"],
                        "__collection__": {
                            "friends": {
                                "__doc__": {
                                    "user_b": { "reference": "__ref__:users/user_b" }
                                }
                            }
                        }
                    },
                    "user_b": {
                        "age": 10,
                        "username": "user_b",
                        "createdOn": created_on(),
                    },
                    "user_c": {
                        "age": 20,
                        "username": "user_c",
                    },
                }
            }
        }
    }
}

/// A store seeded with [`users_fixture`].
pub async fn test_db() -> Firestore {
    test_db_with(InMemoryStore::builder()).await
}

/// A store seeded with [`users_fixture`] on top of the given builder options.
pub async fn test_db_with(builder: InMemoryStoreBuilder) -> Firestore {
    let backend = builder
        .fixture(users_fixture())
        .build()
        .await
        .expect("Failed to build in-memory store");

    Firestore::new(backend)
}

/// A store with nothing in it.
pub async fn empty_db() -> Firestore {
    Firestore::new(
        InMemoryStore::builder()
            .build()
            .await
            .expect("Failed to build in-memory store"),
    )
}

pub fn user(db: &Firestore, id: &str) -> DocumentReference {
    db.collection("users")
        .and_then(|users| users.doc(id))
        .expect("valid user path")
}

/// The message of a write-validation error.
pub fn invalid_data_message(err: DocumentStoreError) -> String {
    match err {
        DocumentStoreError::InvalidData { message, .. } => message,
        other => panic!("expected invalid data error, got {other:?}"),
    }
}
