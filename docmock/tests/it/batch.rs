use bson::{Bson, doc};

use docmock::prelude::*;

use crate::helpers::{test_db, user};

#[tokio::test]
async fn batch_applies_writes_in_order() {
    let db = test_db().await;
    let user_a = user(&db, "user_a");
    let user_b = user(&db, "user_b");
    let user_d = user(&db, "user_d");

    let mut batch = db.batch();
    batch
        .set(&user_d, doc! { "username": "user_d" })
        .update(&user_d, doc! { "age": 30 })
        .set_with_options(&user_a, doc! { "name": "A" }, SetOptions::merge())
        .delete(&user_b);
    assert_eq!(batch.writes().len(), 4);

    batch.commit().await.unwrap();

    let created = user_d.get().await.unwrap();
    assert_eq!(created.raw_data(), Some(&doc! { "username": "user_d", "age": 30 }));
    assert_eq!(user_a.get().await.unwrap().get("age").unwrap(), Bson::Int32(15));
    assert_eq!(user_a.get().await.unwrap().get("name").unwrap(), Bson::String("A".into()));
    assert!(!user_b.get().await.unwrap().exists());
}

#[tokio::test]
async fn failing_batch_write_stops_the_commit() {
    let db = test_db().await;
    let user_a = user(&db, "user_a");
    let user_c = user(&db, "user_c");

    let mut batch = WriteBatch::new();
    batch
        .update(&user_a, doc! { "age": 16 })
        .update(&user(&db, "user_100"), doc! { "age": 1 })
        .delete(&user_c);

    let err = batch.commit().await.unwrap_err();
    assert_eq!(err, DocumentStoreError::DocumentDoesNotExist { path: "users/user_100".into() });

    assert_eq!(user_a.get().await.unwrap().get("age").unwrap(), Bson::Int32(16));
    assert!(user_c.get().await.unwrap().exists());
}

#[tokio::test]
async fn transaction_reads_and_writes_through_references() {
    let db = test_db().await;
    let user_a = user(&db, "user_a");

    let previous = db
        .run_transaction(|tx| {
            let reference = user_a.clone();

            async move {
                let snapshot = tx.get(&reference).await?;
                let age = snapshot
                    .get("age")
                    .and_then(|age| age.as_bson().and_then(Bson::as_i32))
                    .unwrap_or_default();

                tx.update(&reference, WriteData::new().field("age", age + 1))
                    .await?;
                tx.set_with_options(&reference, doc! { "touched": true }, SetOptions::merge())
                    .await?;

                Ok(age)
            }
        })
        .await
        .unwrap();

    assert_eq!(previous, 15);

    let snapshot = user_a.get().await.unwrap();
    assert_eq!(snapshot.get("age").unwrap(), Bson::Int32(16));
    assert_eq!(snapshot.get("touched").unwrap(), Bson::Boolean(true));
}

#[tokio::test]
async fn transaction_errors_propagate() {
    let db = test_db().await;
    let user_c = user(&db, "user_c");
    let missing = user(&db, "user_100");

    let result = db
        .run_transaction(|tx| {
            let (user_c, missing) = (user_c.clone(), missing.clone());

            async move {
                tx.delete(&user_c).await?;
                tx.update(&missing, doc! { "age": 1 }).await
            }
        })
        .await;

    assert!(matches!(result, Err(DocumentStoreError::DocumentDoesNotExist { .. })));
    assert!(!user_c.get().await.unwrap().exists());
}
