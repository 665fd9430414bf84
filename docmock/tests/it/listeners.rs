use bson::{Bson, doc};
use std::time::Duration;
use tokio::{
    sync::mpsc::{UnboundedReceiver, unbounded_channel},
    time::timeout,
};

use docmock::{
    memory::{InMemoryStore, InMemoryStoreBuilder},
    prelude::*,
};

use crate::helpers::{test_db, test_db_with, user};

const WAIT: Duration = Duration::from_millis(500);

async fn next<T>(receiver: &mut UnboundedReceiver<T>) -> T {
    timeout(WAIT, receiver.recv())
        .await
        .expect("timed out waiting for a snapshot")
        .expect("listener channel closed")
}

async fn assert_silent<T>(receiver: &mut UnboundedReceiver<T>) {
    assert!(timeout(Duration::from_millis(50), receiver.recv()).await.is_err());
}

fn listening_builder() -> InMemoryStoreBuilder {
    InMemoryStore::builder()
        .naive_snapshot_listener(true)
        .notification_delay(Duration::from_millis(1))
}

#[tokio::test]
async fn document_listener_receives_the_initial_snapshot_only_by_default() {
    let db = test_db().await;
    let (sender, mut receiver) = unbounded_channel();

    let registration = user(&db, "user_a").on_snapshot(move |snapshot| {
        let _ = sender.send(snapshot);
    });
    assert!(!registration.is_registered());

    let initial = next(&mut receiver).await;
    assert_eq!(initial.get("age").unwrap(), Bson::Int32(15));

    user(&db, "user_a").update(doc! { "age": 16 }).await.unwrap();
    assert_silent(&mut receiver).await;

    registration.remove();
}

#[tokio::test]
async fn document_listener_is_woken_by_writes_until_removed() {
    let db = test_db_with(listening_builder()).await;
    let reference = user(&db, "user_a");
    let (sender, mut receiver) = unbounded_channel();

    let registration = reference.on_snapshot(move |snapshot| {
        let _ = sender.send(snapshot);
    });
    assert!(registration.is_registered());
    assert_eq!(next(&mut receiver).await.get("age").unwrap(), Bson::Int32(15));

    reference.update(doc! { "age": 16 }).await.unwrap();
    assert_eq!(next(&mut receiver).await.get("age").unwrap(), Bson::Int32(16));

    // Unrelated paths still wake every listener.
    user(&db, "user_c").delete().await.unwrap();
    assert_eq!(next(&mut receiver).await.get("age").unwrap(), Bson::Int32(16));

    registration.remove();
    reference.update(doc! { "age": 17 }).await.unwrap();
    assert_silent(&mut receiver).await;
}

#[tokio::test]
async fn query_listener_re_evaluates_after_writes() {
    let db = test_db_with(listening_builder()).await;
    let (sender, mut receiver) = unbounded_channel();

    let registration = db
        .collection("users")
        .unwrap()
        .order_by("age", SortDirection::Asc)
        .on_snapshot(move |snapshot: QuerySnapshot| {
            let ids = snapshot
                .ids()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>();
            let _ = sender.send(ids);
        });

    assert_eq!(next(&mut receiver).await, ["user_b", "user_a", "user_c"]);

    user(&db, "user_d").set(doc! { "age": 1 }).await.unwrap();
    assert_eq!(next(&mut receiver).await, ["user_d", "user_b", "user_a", "user_c"]);

    registration.remove();
}

#[tokio::test]
async fn rejected_writes_do_not_notify() {
    let db = test_db_with(listening_builder()).await;
    let (sender, mut receiver) = unbounded_channel();

    let registration = db
        .collection("users")
        .unwrap()
        .on_snapshot(move |snapshot| {
            let _ = sender.send(snapshot.size());
        });
    assert_eq!(next(&mut receiver).await, 3);

    assert!(user(&db, "user_100").update(doc! { "age": 1 }).await.is_err());
    assert_silent(&mut receiver).await;

    registration.remove();
}
