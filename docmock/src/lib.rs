//! An in-memory stand-in for a hierarchical document database, for tests.
//!
//! This crate is the primary entry point. It re-exports the core types from
//! `docmock-core` and the in-memory backend from `docmock-memory`.
//!
//! # Features
//!
//! - **Collections and documents** - Slash-delimited paths with collection/document parity
//! - **Writes** - Overwriting and merging `set`, dotted-path `update`, `delete`
//! - **Field transforms** - `increment`, `array_union`, `array_remove`, `delete`, `server_timestamp`
//! - **Queries** - `order_by`, cursors, `limit` and `where_field` over live documents
//! - **Batches and transactions** - Grouped writes applied against live data
//! - **Snapshot listeners** - Optional coarse change notification
//!
//! # Quick Start
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let db = Firestore::new(InMemoryStore::builder().build().await?);
//!     let users = db.collection("users")?;
//!
//!     users.doc("user_a")?.set(doc! { "age": 15, "username": "user_a" }).await?;
//!     users.doc("user_b")?.set(doc! { "age": 10, "username": "user_b" }).await?;
//!
//!     // Merge a field in, then update a nested one with a dotted key
//!     users
//!         .doc("user_a")?
//!         .set_with_options(doc! { "address": { "home": "San Francisco" } }, SetOptions::merge())
//!         .await?;
//!     users
//!         .doc("user_a")?
//!         .update(WriteData::new().field("address.work", "Silicon Valley"))
//!         .await?;
//!
//!     let snapshot = users
//!         .order_by("age", SortDirection::Asc)
//!         .start_at(12)?
//!         .get()
//!         .await?;
//!
//!     assert_eq!(snapshot.ids(), vec!["user_a"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Fixtures
//!
//! A store can be seeded from fixture data that nests collections under
//! `__collection__` and documents under `__doc__`:
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//!
//! let db = Firestore::new(
//!     InMemoryStore::builder()
//!         .fixture_json(serde_json::json!({
//!             "__collection__": {
//!                 "users": { "__doc__": { "user_a": { "age": 15 } } }
//!             }
//!         }))
//!         .build()
//!         .await?,
//! );
//! ```
//!
//! # Snapshot listeners
//!
//! `on_snapshot` delivers one snapshot shortly after registration. With
//! `naive_snapshot_listener(true)` on the builder, every later write re-delivers
//! to every listener until [`ListenerRegistration::remove`](reference::ListenerRegistration::remove)
//! is called.
//!
//! # Backends
//!
//! - [`memory`] - The in-memory document tree

pub mod prelude;

pub use docmock_core::{backend, batch, error, path, query, reference, snapshot, store, value};
pub use docmock_core::store::Firestore;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmock_memory::{InMemoryStore, InMemoryStoreBuilder, fixture, tree::DocumentState};
}
