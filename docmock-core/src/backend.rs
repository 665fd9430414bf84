//! Storage backend abstraction for the document store.
//!
//! Reference handles ([`DocumentReference`](crate::reference::DocumentReference),
//! [`CollectionReference`](crate::reference::CollectionReference)) hold an
//! `Arc<dyn StoreBackend>` back to the store that owns the document tree and
//! forward every read and write through this trait. Paths handed to a backend
//! have already passed the segment-parity check.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances

use async_trait::async_trait;
use bson::Document;
use futures::future::BoxFuture;
use std::{fmt::Debug, sync::Arc};

use crate::{error::DocumentStoreResult, path::Path, query::QueryOp, value::WriteData};

/// A store-wide change listener. The returned future performs the re-read and delivery.
pub type ListenerCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifies a registered change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Options for `set` writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge into the existing fields instead of replacing them.
    pub merge: bool,
}

impl SetOptions {
    /// Options for a merging `set`.
    pub fn merge() -> Self {
        Self { merge: true }
    }
}

/// Abstract interface for document storage backends.
///
/// Implementers own the document tree. Documents are addressed by absolute
/// [`Path`]s; a backend materialises missing nodes on demand and never reports
/// a missing document as an error on reads.
///
/// # Notifications
///
/// Every successful `set_document`, `update_document` and `delete_document` must
/// notify all registered listeners, regardless of which path changed.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Reads a document's fields, or `None` if the document does not exist.
    async fn get_document(&self, path: &Path) -> DocumentStoreResult<Option<Document>>;

    /// Writes a document, replacing its fields or merging into them.
    ///
    /// Validation happens before anything is written; a rejected payload leaves the
    /// document untouched.
    async fn set_document(
        &self,
        path: &Path,
        data: WriteData,
        options: SetOptions,
    ) -> DocumentStoreResult<()>;

    /// Applies a partial update with dotted-path keys to an existing document.
    ///
    /// Returns [`DocumentStoreError::DocumentDoesNotExist`](crate::error::DocumentStoreError::DocumentDoesNotExist)
    /// if the document was never written or has been deleted.
    async fn update_document(&self, path: &Path, data: WriteData) -> DocumentStoreResult<()>;

    /// Marks a document as deleted and clears its fields. Sub-collections survive.
    async fn delete_document(&self, path: &Path) -> DocumentStoreResult<()>;

    /// Evaluates query operations against the live documents of a collection.
    ///
    /// Returns `(id, fields)` pairs in result order.
    async fn query_documents(
        &self,
        collection: &Path,
        operations: &[QueryOp],
    ) -> DocumentStoreResult<Vec<(String, Document)>>;

    /// Lists the ids of the collections under a document, or the root collections
    /// when `parent` is the root path.
    async fn list_collections(&self, parent: &Path) -> DocumentStoreResult<Vec<String>>;

    /// Registers a store-wide change listener.
    ///
    /// Returns `None` when the backend does not deliver change notifications.
    fn add_listener(&self, listener: ListenerCallback) -> Option<ListenerId>;

    /// Removes a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Runs a task after the backend's notification delay.
    fn defer(&self, task: BoxFuture<'static, ()>);
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
