//! In-memory document tree backend for docmock.
//!
//! This crate provides the [`InMemoryStore`], an implementation of the
//! `StoreBackend` trait that keeps a hierarchical tree of collections and
//! documents in process memory. It is meant to stand in for a remote document
//! database in tests.
//!
//! # Features
//!
//! - **Lazy materialisation** - Nodes are created the first time a path through them is resolved
//! - **Tri-state documents** - Unmaterialized, live and deleted documents, see [`tree::DocumentState`]
//! - **Field transforms** - Increment, array union/remove, field delete and server timestamps
//! - **Queries** - Ordering, cursors, limits and filters over live documents
//! - **Fixtures** - Seed the tree from BSON or JSON
//! - **Snapshot listeners** - Optional store-wide change notification
//!
//! # Quick Start
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Firestore::new(InMemoryStore::builder().build().await?);
//!
//!     let alice = db.doc("users/alice")?;
//!     alice.set(doc! { "age": 15 }).await?;
//!     alice
//!         .update(WriteData::new().field("age", FieldValues::increment(1)))
//!         .await?;
//!
//!     assert_eq!(alice.get().await?.get("age").unwrap(), bson::Bson::Int32(16));
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmock_memory;

pub mod evaluator;
pub mod fixture;
pub mod listener;
pub mod store;
pub mod tree;
pub mod write;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
