use bson::Bson;

use docmock::prelude::*;

use crate::helpers::{created_on, test_db, user};

#[tokio::test]
async fn get_reads_top_level_and_nested_fields() {
    let db = test_db().await;
    let snapshot = user(&db, "user_a").get().await.unwrap();

    assert!(snapshot.exists());
    assert_eq!(snapshot.id(), "user_a");
    assert_eq!(snapshot.reference(), &user(&db, "user_a"));
    assert_eq!(snapshot.get("age").unwrap(), Bson::Int32(15));
    assert_eq!(snapshot.get("address.home").unwrap(), Bson::String("San Francisco".into()));
    assert_eq!(
        snapshot.get("createdOn").unwrap().as_timestamp(),
        Some(created_on().to_chrono())
    );
    assert!(snapshot.get("address.city").is_none());
    assert!(snapshot.get("age.years").is_none());
    assert!(snapshot.get("missing").is_none());
}

#[tokio::test]
async fn encoded_references_decode_into_handles() {
    let db = test_db().await;
    let friend = db
        .doc("users/user_a/friends/user_b")
        .unwrap()
        .get()
        .await
        .unwrap();

    let reference = friend
        .get("reference")
        .and_then(|field| field.as_reference().cloned())
        .unwrap();
    assert_eq!(reference, user(&db, "user_b"));

    let target = reference.get().await.unwrap();
    assert_eq!(target.get("age").unwrap(), Bson::Int32(10));
    assert_eq!(target.get("username").unwrap(), Bson::String("user_b".into()));

    assert_eq!(
        friend.raw_data().unwrap().get_str("reference").unwrap(),
        "__ref__:users/user_b"
    );
}

#[tokio::test]
async fn missing_documents_have_no_data() {
    let db = test_db().await;
    let snapshot = user(&db, "user_100").get().await.unwrap();

    assert!(!snapshot.exists());
    assert_eq!(snapshot.id(), "user_100");
    assert!(snapshot.data().is_none());
    assert!(snapshot.get("age").is_none());
    assert_eq!(snapshot.deserialize::<bson::Document>().unwrap(), None);
}

#[tokio::test]
async fn snapshots_are_point_in_time_copies() {
    let db = test_db().await;
    let reference = user(&db, "user_c");

    let before = reference.get().await.unwrap();
    reference
        .update(WriteData::new().field("age", 21))
        .await
        .unwrap();

    assert_eq!(before.get("age").unwrap(), Bson::Int32(20));
    assert_eq!(reference.get().await.unwrap().get("age").unwrap(), Bson::Int32(21));
}

#[tokio::test]
async fn collection_snapshots_list_live_documents() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    let snapshot = users.get().await.unwrap();
    assert_eq!(snapshot.size(), 3);
    assert!(!snapshot.is_empty());
    assert_eq!(snapshot.ids(), vec!["user_a", "user_b", "user_c"]);

    let mut usernames = Vec::new();
    snapshot.for_each(|document| {
        if let Some(FieldData::Value(Bson::String(name))) = document.get("username") {
            usernames.push(name);
        }
    });
    assert_eq!(usernames, vec!["user_a", "user_b", "user_c"]);

    let ages = snapshot
        .iter()
        .filter_map(|document| document.get("age"))
        .collect::<Vec<_>>();
    assert_eq!(ages, vec![Bson::Int32(15), Bson::Int32(10), Bson::Int32(20)]);

    let empty = db.collection("groups").unwrap().get().await.unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.size(), 0);
}
