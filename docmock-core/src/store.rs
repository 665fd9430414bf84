//! Main store interface.
//!
//! [`Firestore`] is the entry point: it owns an `Arc<dyn StoreBackend>` and
//! hands out root collection and document references bound to it. Dropping the
//! last handle (the store and every reference cloned from it) drops the tree.
//!
//! # Example
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//!
//! let db = Firestore::new(InMemoryStore::builder().build().await?);
//! let alice = db.doc("users/alice")?;
//! alice.set(doc! { "age": 15 }).await?;
//! ```

use std::{future::Future, sync::Arc};

use crate::{
    backend::StoreBackend,
    batch::{Transaction, WriteBatch},
    error::DocumentStoreResult,
    path::Path,
    reference::{CollectionReference, DocumentReference},
};

/// An in-process document store handle.
#[derive(Debug, Clone)]
pub struct Firestore {
    backend: Arc<dyn StoreBackend>,
}

impl Firestore {
    /// Creates a store over the given backend.
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self { backend: Arc::new(backend) }
    }

    /// Creates a store over a shared backend.
    pub fn from_backend(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// A collection addressed by an absolute path with an odd number of segments.
    ///
    /// # Errors
    ///
    /// Returns a path error if `path` is malformed or has an even number of segments.
    pub fn collection(&self, path: &str) -> DocumentStoreResult<CollectionReference> {
        CollectionReference::resolve(&Path::root(), path, self.backend.clone())
    }

    /// A document addressed by an absolute path with an even number of segments.
    pub fn doc(&self, path: &str) -> DocumentStoreResult<DocumentReference> {
        DocumentReference::resolve(&Path::root(), path, self.backend.clone())
    }

    /// The root collections.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<CollectionReference>> {
        self.backend
            .list_collections(&Path::root())
            .await?
            .iter()
            .map(|id| self.collection(id))
            .collect()
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Runs `executor` with a [`Transaction`] whose writes apply immediately.
    pub async fn run_transaction<F, Fut, T>(&self, executor: F) -> DocumentStoreResult<T>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = DocumentStoreResult<T>>,
    {
        executor(Transaction).await
    }
}
