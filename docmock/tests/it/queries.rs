use docmock::prelude::*;

use bson::doc;

use crate::helpers::{empty_db, test_db, user};

async fn ids(query: Query) -> Vec<String> {
    query
        .get()
        .await
        .unwrap()
        .ids()
        .into_iter()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn order_by_sorts_in_both_directions() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    assert_eq!(ids(users.order_by("age", SortDirection::Asc)).await, ["user_b", "user_a", "user_c"]);
    assert_eq!(ids(users.order_by("age", SortDirection::Desc)).await, ["user_c", "user_a", "user_b"]);
}

#[tokio::test]
async fn cursors_bound_the_ordered_field() {
    let db = test_db().await;
    let by_age = db
        .collection("users")
        .unwrap()
        .order_by("age", SortDirection::Asc);

    assert_eq!(ids(by_age.clone().start_at(15).unwrap()).await, ["user_a", "user_c"]);
    assert_eq!(ids(by_age.clone().start_after(15).unwrap()).await, ["user_c"]);
    assert_eq!(ids(by_age.clone().end_at(15).unwrap()).await, ["user_b", "user_a"]);
    assert_eq!(ids(by_age.end_before(15).unwrap()).await, ["user_b"]);
}

#[tokio::test]
async fn cursors_require_an_order_by() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    let err = users.start_at(15).unwrap_err();
    assert_eq!(err, DocumentStoreError::CursorWithoutOrderBy { cursor: "startAt".into() });
    assert_eq!(err.to_string(), "startAt() queries requires orderBy()");

    let err = users
        .where_field("age", WhereOp::Gt, 1)
        .end_before(15)
        .unwrap_err();
    assert_eq!(err.to_string(), "endBefore() queries requires orderBy()");

    assert!(users.start_after(15).is_err());
    assert!(users.end_at(15).is_err());
}

#[tokio::test]
async fn where_filters_by_equality_and_range() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    assert_eq!(ids(users.where_field("age", WhereOp::Eq, 15)).await, ["user_a"]);
    assert_eq!(ids(users.where_field("age", WhereOp::Gte, 15)).await, ["user_a", "user_c"]);
    assert_eq!(ids(users.where_field("age", WhereOp::Lt, 15)).await, ["user_b"]);
    assert_eq!(
        ids(users.where_field("address.home", WhereOp::Eq, "San Francisco")).await,
        ["user_a"]
    );
    assert!(ids(users.where_field("age", WhereOp::Gt, "15")).await.is_empty());

    let chained = users
        .where_field("age", WhereOp::Gt, 5)
        .where_field("age", WhereOp::Lte, 15);
    assert_eq!(ids(chained).await, ["user_a", "user_b"]);
}

#[tokio::test]
async fn where_supports_array_and_membership_operators() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    assert_eq!(
        ids(users.where_field("pinnedBooks", WhereOp::ArrayContains, "book_1")).await,
        ["user_a"]
    );
    assert_eq!(
        ids(users.where_field("pinnedFoods", WhereOp::ArrayContainsAny, vec!["food_2", "food_9"])).await,
        ["user_a"]
    );
    assert_eq!(
        ids(users.where_field("username", WhereOp::In, vec!["user_b", "user_c"])).await,
        ["user_b", "user_c"]
    );
    assert_eq!("array-contains-any".parse::<WhereOp>().unwrap(), WhereOp::ArrayContainsAny);
    assert!("!=".parse::<WhereOp>().is_err());
}

#[tokio::test]
async fn where_matches_references_by_path() {
    let db = test_db().await;
    let friends = user(&db, "user_a").collection("friends").unwrap();

    assert_eq!(
        ids(friends.where_field("reference", WhereOp::Eq, user(&db, "user_b"))).await,
        ["user_b"]
    );
    assert!(
        ids(friends.where_field("reference", WhereOp::Eq, user(&db, "user_c")))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn limit_runs_after_ordering_and_before_filters() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    assert_eq!(ids(users.limit(2)).await, ["user_a", "user_b"]);
    assert_eq!(
        ids(users.order_by("age", SortDirection::Asc).limit(2)).await,
        ["user_b", "user_a"]
    );

    let filtered_then_limited = users
        .where_field("age", WhereOp::Gte, 15)
        .limit(2);
    assert_eq!(ids(filtered_then_limited).await, ["user_a"]);

    let limited_then_ordered = users
        .limit(1)
        .order_by("age", SortDirection::Desc);
    assert_eq!(ids(limited_then_ordered).await, ["user_c"]);
}

#[tokio::test]
async fn queries_only_see_live_documents() {
    let db = test_db().await;
    let users = db.collection("users").unwrap();

    user(&db, "user_b").delete().await.unwrap();
    assert!(!user(&db, "user_z").get().await.unwrap().exists());

    assert_eq!(ids(users.query()).await, ["user_a", "user_c"]);
    assert_eq!(ids(users.order_by("age", SortDirection::Asc)).await, ["user_a", "user_c"]);
}

#[tokio::test]
async fn select_returns_every_field() {
    let db = test_db().await;

    let snapshot = db
        .collection("users")
        .unwrap()
        .select(["username"])
        .where_field("age", WhereOp::Eq, 15)
        .get()
        .await
        .unwrap();

    let document = &snapshot.docs()[0];
    assert!(document.get("username").is_some());
    assert!(document.get("address.home").is_some());
}

#[tokio::test]
async fn order_by_sorts_numbers_around_missing_and_mismatched_fields() {
    let db = empty_db().await;
    let people = db.collection("people").unwrap();

    for (id, data) in [
        ("a", doc! { "age": 3 }),
        ("b", doc! { "name": "no age" }),
        ("c", doc! { "age": 1 }),
        ("d", doc! { "age": "old" }),
        ("e", doc! { "age": 2 }),
    ] {
        people.doc(id).unwrap().set(data).await.unwrap();
    }

    assert_eq!(ids(people.order_by("age", SortDirection::Asc)).await, ["b", "c", "e", "a", "d"]);
    assert_eq!(ids(people.order_by("age", SortDirection::Desc)).await, ["d", "a", "e", "c", "b"]);

    let from_two = people
        .order_by("age", SortDirection::Asc)
        .start_at(2)
        .unwrap();
    assert_eq!(ids(from_two).await, ["e", "a"]);

    let up_to_two = people
        .order_by("age", SortDirection::Asc)
        .end_at(2)
        .unwrap();
    assert_eq!(ids(up_to_two).await, ["c", "e"]);
}
