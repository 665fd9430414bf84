//! An in-process mock of a hierarchical document database, for tests.
//!
//! This crate is the core of the docmock project and provides:
//!
//! - **Paths** ([`path`]) - Slash-separated paths, segment parity and reference encoding
//! - **Write values** ([`value`]) - Field values and write sentinels such as increment and delete
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing document tree backends
//! - **References** ([`reference`]) - Collection and document handles
//! - **Queries** ([`query`]) - Ordering, cursors, limits and filters over a collection
//! - **Snapshots** ([`snapshot`]) - Point-in-time read results
//! - **Batches and transactions** ([`batch`]) - Grouped writes without isolation
//! - **Store** ([`store`]) - The [`Firestore`](store::Firestore) entry point
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let db = Firestore::new(InMemoryStore::builder().build().await?);
//! let users = db.collection("users")?;
//!
//! users.doc("alice")?.set(doc! { "age": 15 }).await?;
//! users.doc("bob")?.set(doc! { "age": 10 }).await?;
//!
//! let youngest = users
//!     .order_by("age", SortDirection::Asc)
//!     .limit(1)
//!     .get()
//!     .await?;
//! assert_eq!(youngest.ids(), vec!["bob"]);
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmock_core;

pub mod backend;
pub mod batch;
pub mod error;
pub mod path;
pub mod query;
pub mod reference;
pub mod snapshot;
pub mod store;
pub mod value;
