//! In-memory storage implementation of the document tree.
//!
//! [`InMemoryStore`] owns a [`DocumentTree`] behind an async-aware read-write
//! lock. Every operation takes the lock once, so operations are atomic with
//! respect to each other and resolve in program order: the last write wins.

use async_trait::async_trait;
use bson::{DateTime, Document};
use futures::future::BoxFuture;
use mea::rwlock::RwLock;
use std::{sync::Arc, time::Duration};
use tracing::debug;

use docmock_core::{
    backend::{ListenerCallback, ListenerId, SetOptions, StoreBackend, StoreBackendBuilder},
    error::DocumentStoreResult,
    path::Path,
    query::QueryOp,
    value::WriteData,
};

use crate::{
    evaluator::QueryEvaluator,
    fixture,
    listener::{DEFAULT_NOTIFICATION_DELAY, ListenerRegistry},
    tree::DocumentTree,
    write,
};

/// Thread-safe in-memory document storage backend.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses `Arc`-wrapped internal state, so it can
/// be shared across async tasks. Clones share the same tree and listeners.
///
/// # Example
///
/// ```ignore
/// use docmock_memory::InMemoryStore;
/// use docmock::{Firestore, backend::StoreBackendBuilder};
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryStore::builder()
///         .fixture(doc! {
///             "__collection__": { "users": { "__doc__": { "alice": { "age": 15 } } } }
///         })
///         .build()
///         .await?;
///     let db = Firestore::new(backend);
///
///     let alice = db.doc("users/alice")?.get().await?;
///     assert!(alice.exists());
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The document tree, rooted at the store's collections.
    tree: Arc<RwLock<DocumentTree>>,
    /// Snapshot listeners woken after every write.
    listeners: Arc<ListenerRegistry>,
}

impl InMemoryStore {
    /// Creates a new empty store with snapshot listeners disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docmock_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .naive_snapshot_listener(true)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn with_tree(tree: DocumentTree, listeners: ListenerRegistry) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
            listeners: Arc::new(listeners),
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn get_document(&self, path: &Path) -> DocumentStoreResult<Option<Document>> {
        let mut tree = self.tree.write().await;
        let node = tree.document_mut(path)?;

        Ok(node.data().cloned())
    }

    async fn set_document(&self, path: &Path, data: WriteData, options: SetOptions) -> DocumentStoreResult<()> {
        debug!(path = %path, merge = options.merge, fields = data.len(), "Setting document");

        {
            let mut tree = self.tree.write().await;
            let node = tree.document_mut(path)?;
            write::apply_set(node, data, options.merge, DateTime::now())?;
        }

        self.listeners.notify();
        Ok(())
    }

    async fn update_document(&self, path: &Path, data: WriteData) -> DocumentStoreResult<()> {
        debug!(path = %path, fields = data.len(), "Updating document");

        {
            let mut tree = self.tree.write().await;
            let node = tree.document_mut(path)?;
            write::apply_update(node, path, data, DateTime::now())?;
        }

        self.listeners.notify();
        Ok(())
    }

    async fn delete_document(&self, path: &Path) -> DocumentStoreResult<()> {
        debug!(path = %path, "Deleting document");

        {
            let mut tree = self.tree.write().await;
            write::apply_delete(tree.document_mut(path)?);
        }

        self.listeners.notify();
        Ok(())
    }

    async fn query_documents(
        &self,
        collection: &Path,
        operations: &[QueryOp],
    ) -> DocumentStoreResult<Vec<(String, Document)>> {
        let rows = {
            let mut tree = self.tree.write().await;

            tree.collection_mut(collection)?
                .live_documents()
                .map(|(id, data)| (id.to_string(), data.clone()))
                .collect::<Vec<_>>()
        };

        debug!(collection = %collection, documents = rows.len(), operations = operations.len(), "Evaluating query");

        QueryEvaluator::evaluate(rows, operations)
    }

    async fn list_collections(&self, parent: &Path) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.tree
                .read()
                .await
                .collection_ids(parent)
        )
    }

    fn add_listener(&self, listener: ListenerCallback) -> Option<ListenerId> {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }

    fn defer(&self, task: BoxFuture<'static, ()>) {
        self.listeners.defer(task);
    }
}

/// Initial tree contents for a builder.
#[derive(Debug, Clone)]
enum Fixture {
    Bson(Document),
    Json(serde_json::Value),
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docmock_memory::InMemoryStore;
/// use docmock::backend::StoreBackendBuilder;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder()
///         .naive_snapshot_listener(true)
///         .notification_delay(Duration::from_millis(1))
///         .build()
///         .await
///         .unwrap();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStoreBuilder {
    fixture: Option<Fixture>,
    naive_snapshot_listener: bool,
    notification_delay: Duration,
}

impl Default for InMemoryStoreBuilder {
    fn default() -> Self {
        Self {
            fixture: None,
            naive_snapshot_listener: false,
            notification_delay: DEFAULT_NOTIFICATION_DELAY,
        }
    }
}

impl InMemoryStoreBuilder {
    /// Seeds the tree from a BSON fixture.
    pub fn fixture(mut self, fixture: Document) -> Self {
        self.fixture = Some(Fixture::Bson(fixture));
        self
    }

    /// Seeds the tree from a JSON fixture.
    pub fn fixture_json(mut self, fixture: serde_json::Value) -> Self {
        self.fixture = Some(Fixture::Json(fixture));
        self
    }

    /// Re-delivers snapshots to every listener after each write. Disabled by default.
    pub fn naive_snapshot_listener(mut self, enabled: bool) -> Self {
        self.naive_snapshot_listener = enabled;
        self
    }

    /// Delay before snapshot delivery. Defaults to 10 ms.
    pub fn notification_delay(mut self, delay: Duration) -> Self {
        self.notification_delay = delay;
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds a store, loading the fixture if one was given.
    ///
    /// # Errors
    ///
    /// Returns an initialization error if the fixture is badly shaped.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let tree = match &self.fixture {
            Some(Fixture::Bson(document)) => fixture::load(document)?,
            Some(Fixture::Json(value)) => fixture::load_json(value)?,
            None => DocumentTree::new(),
        };

        let listeners = ListenerRegistry::new(self.naive_snapshot_listener, self.notification_delay);

        Ok(InMemoryStore::with_tree(tree, listeners))
    }
}
